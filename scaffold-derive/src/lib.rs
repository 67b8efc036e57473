//! Derive macros for the `scaffold` crate.

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod helpers;
mod record;

/// Derive an implementation of `Record` for a struct.
///
/// The derived `descriptor()` describes the struct as a record whose class and schema type are
/// both named after the struct, with one field per struct field. Field names are converted to
/// camelCase, the GraphQL scalar of each field is implied by its Rust type (see `RecordField`),
/// and `Option` fields are nullable. Doc comments on the struct and its fields become the
/// descriptions of the corresponding schema type and fields.
///
/// The derived `into_row()` converts a value of the struct into a `Row` of the record's class.
///
/// # Examples
///
/// ```
/// # mod example {
/// use scaffold::{record::Record, Record};
///
/// /// A blog post.
/// #[derive(Record)]
/// #[record(class = "App.Model.Post")]
/// struct Post {
///     id: i64,
///     /// The headline.
///     title: String,
///     #[record(db = "Datetime")]
///     published_at: Option<String>,
///     #[record(skip)]
///     draft: Vec<u8>,
/// }
///
/// # pub fn example() {
/// let desc = Post::descriptor();
/// assert_eq!(desc.class(), "App.Model.Post");
/// assert_eq!(desc.type_name(), "Post");
/// assert_eq!(desc.fields()[2].name(), "publishedAt");
/// assert_eq!(desc.fields()[2].type_ref().to_string(), "String");
/// # }
/// # }
/// # example::example();
/// ```
///
/// # Struct attributes
///
/// | Attribute     | Description                                             | Arg     | Required |
/// |---------------|---------------------------------------------------------|---------|----------|
/// | name          | Name of the schema type. Defaults to the struct name.   | string  | no       |
/// | class         | Class identifier carried by rows. Defaults to the type name. | string | no   |
///
/// # Field attributes
///
/// | Attribute     | Description                                             | Arg     | Required |
/// |---------------|---------------------------------------------------------|---------|----------|
/// | name          | Name of the schema field. Defaults to the camelCase field name. | string | no |
/// | db            | Declared storage type, such as `Varchar(255)`, used instead of the Rust type to choose the scalar. | string | no |
/// | skip          | Do not include this field in the record.                | n/a     | no       |
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive(parse_macro_input!(input)).into()
}
