//! The `DataObject` interface shared by every record type.

use super::{FieldDefinition, InterfaceDefinition, Manager, TypeDefinition};
use crate::{error::UnresolvedTypeSnafu, record::Row, Error};
use async_graphql::dynamic::{FieldValue, TypeRef};
use snafu::OptionExt;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

/// Name of the interface implemented by every record object type.
pub const DATA_OBJECT: &str = "DataObject";

/// The fields common to all records, resolved from the parent [`Row`].
pub fn fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::property("id", TypeRef::named_nn(TypeRef::INT)),
        FieldDefinition::property("created", TypeRef::named(TypeRef::STRING)),
        FieldDefinition::property("lastEdited", TypeRef::named(TypeRef::STRING)),
    ]
}

/// The `DataObject` interface definition.
pub fn definition() -> InterfaceDefinition {
    let fields = fields()
        .iter()
        .map(|f| FieldDefinition::declared(f.name(), f.ty().clone()))
        .collect::<Vec<_>>();
    InterfaceDefinition::new(DATA_OBJECT, fields).description("Base interface")
}

/// Find the registered object type for a runtime record.
///
/// Returns [`None`] if the record's class was never registered. This is a schema authoring error;
/// the GraphQL engine reports it to the caller as an unresolvable abstract type.
pub fn resolve_type<'m>(manager: &'m Manager, row: &Row) -> Option<&'m TypeDefinition> {
    let name = manager.implementor(row.class()).unwrap_or(row.class());
    manager
        .get_type(name)
        .filter(|ty| ty.as_object().is_some())
}

/// A snapshot of the mapping from record classes to object type names.
///
/// Resolvers run after the [`Manager`] has been consumed, so they consult one of these, taken
/// when the schema is finished.
#[derive(Clone, Debug, Default)]
pub struct TypeResolver {
    implementors: BTreeMap<String, String>,
    objects: BTreeSet<String>,
}

impl TypeResolver {
    pub(super) fn new(implementors: BTreeMap<String, String>, objects: BTreeSet<String>) -> Self {
        Self {
            implementors,
            objects,
        }
    }

    /// The name of the object type for `row`.
    ///
    /// Classes registered via [`Manager::add_record`] resolve to their record type; otherwise an
    /// object type named after the class itself is accepted.
    pub fn resolve(&self, row: &Row) -> Option<&str> {
        let class = row.class();
        match self.implementors.get(class) {
            Some(name) => Some(name),
            None => self.objects.get(class).map(String::as_str),
        }
    }

    /// Like [`resolve`](Self::resolve), but reports unresolvable rows as an error.
    pub fn try_resolve(&self, row: &Row) -> Result<&str, Error> {
        self.resolve(row).context(UnresolvedTypeSnafu { class: row.class() })
    }

    /// Wrap `row` in a field value tagged with its concrete type.
    ///
    /// Rows which cannot be resolved are left untagged, leaving the engine to report the error.
    pub fn tag<'a>(&self, row: Row) -> FieldValue<'a> {
        match self.try_resolve(&row).map(str::to_owned) {
            Ok(ty) => FieldValue::owned_any(row).with_type(ty),
            Err(err) => {
                tracing::warn!("{err}");
                FieldValue::owned_any(row)
            }
        }
    }
}

/// Tags rows returned through an interface with their concrete type.
///
/// Operations are built before every record type is known, so the class mapping is bound later,
/// when the schema is finished. Clones share the binding.
#[derive(Clone, Debug, Default)]
pub struct TypeTagger(Arc<OnceLock<TypeResolver>>);

impl TypeTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the class mapping. Only the first binding takes effect.
    pub fn bind(&self, resolver: &TypeResolver) {
        if self.0.set(resolver.clone()).is_err() {
            tracing::debug!("type tagger already bound");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.0.get().is_some()
    }

    pub fn tag<'a>(&self, row: Row) -> FieldValue<'a> {
        match self.0.get() {
            Some(resolver) => resolver.tag(row),
            None => {
                tracing::warn!("tagging {} before the schema was finished", row.class());
                FieldValue::owned_any(row)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::{FieldDescriptor, FieldKind, RecordDescriptor};

    fn manager() -> Manager {
        let mut manager = Manager::new();
        manager.add_record(
            &RecordDescriptor::new("App.Model.Post", "Post")
                .field(FieldDescriptor::new("title", FieldKind::String)),
        );
        manager.add_record(&RecordDescriptor::new("Member", "Member"));
        manager
    }

    #[test]
    fn test_interface_fields() {
        let interface = definition();
        assert_eq!(interface.name(), DATA_OBJECT);
        assert_eq!(interface.doc(), Some("Base interface"));
        let fields = interface
            .fields()
            .get()
            .iter()
            .map(|f| format!("{}: {}", f.name(), f.ty()))
            .collect::<Vec<_>>();
        assert_eq!(fields, ["id: Int!", "created: String", "lastEdited: String"]);
    }

    #[test]
    fn test_resolve_registered_class() {
        let manager = manager();
        let ty = resolve_type(&manager, &Row::new("App.Model.Post")).unwrap();
        assert_eq!(ty.name(), "Post");
        let ty = resolve_type(&manager, &Row::new("Member")).unwrap();
        assert_eq!(ty.name(), "Member");
    }

    #[test]
    fn test_resolve_by_type_name() {
        let manager = manager();
        // Not registered as a class, but an object type of that name exists.
        assert_eq!(
            resolve_type(&manager, &Row::new("Post")).map(TypeDefinition::name),
            Some("Post")
        );
    }

    #[test]
    fn test_resolve_unregistered_class() {
        let manager = manager();
        assert!(resolve_type(&manager, &Row::new("App.Model.Comment")).is_none());
        // The interface itself is not a concrete type.
        assert!(resolve_type(&manager, &Row::new(DATA_OBJECT)).is_none());
        assert_eq!(
            manager
                .type_resolver()
                .try_resolve(&Row::new("App.Model.Comment"))
                .unwrap_err(),
            Error::UnresolvedType {
                class: "App.Model.Comment".into()
            }
        );
    }

    #[test]
    fn test_tagger_binding_is_shared() {
        let tagger = TypeTagger::new();
        let copy = tagger.clone();
        assert!(!copy.is_bound());
        tagger.bind(&manager().type_resolver());
        assert!(copy.is_bound());

        // Later bindings are ignored.
        tagger.bind(&TypeResolver::default());
        assert_eq!(
            copy.0.get().unwrap().resolve(&Row::new("App.Model.Post")),
            Some("Post")
        );
    }
}
