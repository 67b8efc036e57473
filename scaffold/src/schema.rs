//! Assembly of the GraphQL schema.
//!
//! Types and operations are registered with a [`Manager`] in any order. When the schema is
//! finished, deferred operations are scaffolded against the complete type registry and everything
//! is lowered into an executable [`async_graphql::dynamic::Schema`].

pub mod fields;
pub mod interface;
pub mod manager;
pub mod types;

pub use fields::{object_for_record, parse_type_ref};
pub use interface::{TypeResolver, TypeTagger, DATA_OBJECT};
pub use manager::{Manager, Operation};
pub use types::{
    named_type, ArgumentDefinition, EnumDefinition, FieldDefinition, Fields, InputDefinition,
    InterfaceDefinition, ObjectDefinition, TypeDefinition,
};
