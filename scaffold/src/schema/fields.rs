//! Mapping record metadata and type strings onto schema definitions.

use super::{
    interface::{self, DATA_OBJECT},
    FieldDefinition, ObjectDefinition,
};
use crate::record::RecordDescriptor;
use async_graphql::dynamic::TypeRef;

/// Synthesize the object type for a record.
///
/// The object implements the `DataObject` interface. Interface fields always take their interface
/// type, even if the record declares a field with the same name.
pub fn object_for_record(record: &RecordDescriptor) -> ObjectDefinition {
    let mut fields = interface::fields();
    for field in record.fields() {
        if fields.iter().any(|f| f.name() == field.name()) {
            tracing::debug!(
                "{}.{} is provided by {DATA_OBJECT}",
                record.type_name(),
                field.name()
            );
            continue;
        }
        let mut def = FieldDefinition::property(field.name(), field.type_ref());
        if let Some(doc) = field.doc() {
            def = def.description(doc);
        }
        fields.push(def);
    }

    let mut object = ObjectDefinition::new(record.type_name(), fields).implement(DATA_OBJECT);
    if let Some(doc) = record.doc() {
        object = object.description(doc);
    }
    object
}

/// Parse a GraphQL type expression such as `String`, `Int!` or `[ID!]`.
///
/// Returns [`None`] if the expression is malformed.
pub fn parse_type_ref(ty: &str) -> Option<TypeRef> {
    let ty = ty.trim();
    if let Some(inner) = ty.strip_suffix('!') {
        let inner = parse_type_ref(inner)?;
        if matches!(inner, TypeRef::NonNull(_)) {
            return None;
        }
        return Some(TypeRef::NonNull(Box::new(inner)));
    }
    if let Some(inner) = ty.strip_prefix('[') {
        let inner = inner.strip_suffix(']')?;
        return Some(TypeRef::List(Box::new(parse_type_ref(inner)?)));
    }
    let valid = ty
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if ty.is_empty() || !valid {
        return None;
    }
    Some(TypeRef::named(ty))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::{FieldDescriptor, FieldKind};

    #[test]
    fn test_parse_type_ref() {
        for ty in ["String", "Int!", "[ID]", "[ID!]!", " Boolean "] {
            let parsed = parse_type_ref(ty).unwrap();
            assert_eq!(parsed.to_string(), ty.trim());
        }
        for ty in ["", "!", "Int!!", "[Int", "Int]", "9Lives", "Foo Bar", "[]"] {
            assert!(parse_type_ref(ty).is_none(), "{ty}");
        }
    }

    #[test]
    fn test_object_for_record() {
        let record = RecordDescriptor::new("App.Post", "Post")
            .description("A blog post.")
            .field(FieldDescriptor::new("id", FieldKind::Id))
            .field(FieldDescriptor::declared("title", "Varchar(255)"))
            .field(FieldDescriptor::new("rating", FieldKind::Float).nullable(true));
        let object = object_for_record(&record);

        assert_eq!(object.name(), "Post");
        assert_eq!(object.doc(), Some("A blog post."));
        assert_eq!(object.interfaces(), [DATA_OBJECT]);

        let fields = object
            .fields()
            .get()
            .iter()
            .map(|f| (f.name(), f.ty().to_string()))
            .collect::<Vec<_>>();
        assert_eq!(
            fields,
            [
                ("id", "Int!".to_string()),
                ("created", "String".to_string()),
                ("lastEdited", "String".to_string()),
                ("title", "String!".to_string()),
                ("rating", "Float".to_string()),
            ]
        );
    }
}
