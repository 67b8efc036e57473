//! Derive macro for the `Record` trait.

use crate::helpers::{parse_docs, AttrParser};
use convert_case::{Case, Casing};
use proc_macro2::{Span, TokenStream};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;
use syn::{ext::IdentExt, Data, DeriveInput, Field, Fields, Ident, LitStr};

/// The path of the `scaffold::record` module in the scope invoking a procedural macro.
fn record_path() -> TokenStream {
    let krate = match crate_name("scaffold") {
        Ok(FoundCrate::Itself) => quote!(crate),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(err) => panic!("Record requires the scaffold crate: {err}"),
    };
    quote!(#krate::record)
}

/// Derive a `Record` instance for a struct.
pub fn derive(
    DeriveInput {
        ident,
        generics,
        data,
        attrs,
        ..
    }: DeriveInput,
) -> TokenStream {
    if !generics.params.is_empty() {
        panic!("Record cannot be derived on generic types");
    }
    let Data::Struct(s) = data else {
        panic!("Record can only be derived for structs");
    };
    let Fields::Named(fields) = s.fields else {
        panic!("Record fields must be named");
    };

    let record = record_path();
    let p = AttrParser::new("record");

    let type_name = p
        .get_arg::<LitStr>(&attrs, "name")
        .map(|name| name.value())
        .unwrap_or_else(|| ident.to_string());
    let class = p
        .get_arg::<LitStr>(&attrs, "class")
        .map(|class| class.value())
        .unwrap_or_else(|| type_name.clone());
    let description = description(&parse_docs(&attrs));

    let fields = fields
        .named
        .into_iter()
        .filter(|f| !p.has_bool(&f.attrs, "skip"))
        .collect::<Vec<_>>();
    let descriptors = fields.iter().map(|f| generate_descriptor(&p, &record, f));
    let setters = fields.iter().map(|f| {
        let ident = &f.ident;
        let name = field_name(&p, f);
        quote! {
            row.set(#name, #record::RecordField::into_value(self.#ident));
        }
    });

    quote! {
        impl #record::Record for #ident {
            fn descriptor() -> #record::RecordDescriptor {
                #record::RecordDescriptor::new(#class, #type_name)
                    #description
                    #(.field(#descriptors))*
            }

            fn into_row(self) -> #record::Row {
                let mut row = #record::Row::new(#class);
                #(#setters)*
                row
            }
        }
    }
}

fn generate_descriptor(p: &AttrParser, record: &TokenStream, f: &Field) -> TokenStream {
    let ty = &f.ty;
    let name = field_name(p, f);
    let description = description(&parse_docs(&f.attrs));
    // An explicit storage type overrides the scalar implied by the Rust type.
    let kind = match p.get_arg::<LitStr>(&f.attrs, "db") {
        Some(db) => quote!(#record::FieldKind::from_declared(#db)),
        None => quote!(<#ty as #record::RecordField>::kind()),
    };
    quote! {
        #record::FieldDescriptor::new(#name, #kind)
            .nullable(<#ty as #record::RecordField>::nullable())
            #description
    }
}

/// The name of the field in the schema: explicit, or the Rust name in camelCase.
fn field_name(p: &AttrParser, f: &Field) -> String {
    if let Some(name) = p.get_arg::<LitStr>(&f.attrs, "name") {
        return name.value();
    }
    let Some(ident) = &f.ident else {
        panic!("Record fields must be named");
    };
    ident.unraw().to_string().to_case(Case::Camel)
}

fn description(doc: &str) -> Option<TokenStream> {
    (!doc.is_empty()).then(|| quote!(.description(#doc)))
}
