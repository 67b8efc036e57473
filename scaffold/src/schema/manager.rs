use super::{
    fields::object_for_record,
    interface::{self, TypeResolver},
    TypeDefinition,
};
use crate::{
    record::RecordDescriptor,
    scaffold::{connection, sort, Scaffold},
    Error,
};
use async_graphql::dynamic::{Object, Schema};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug, Formatter};
use std::mem::take;

type Producer = Box<dyn FnOnce(&Manager) -> Result<Scaffold, Error> + Send>;

/// A root operation, either ready to use or produced on demand.
pub enum Operation {
    Ready(Scaffold),
    /// Produced against the complete type registry when the schema is finished.
    Deferred(Producer),
}

impl Operation {
    pub fn deferred(
        producer: impl FnOnce(&Manager) -> Result<Scaffold, Error> + Send + 'static,
    ) -> Self {
        Self::Deferred(Box::new(producer))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn evaluate(self, manager: &Manager) -> Result<Scaffold, Error> {
        match self {
            Self::Ready(scaffold) => Ok(scaffold),
            Self::Deferred(producer) => producer(manager),
        }
    }
}

impl From<Scaffold> for Operation {
    fn from(scaffold: Scaffold) -> Self {
        Self::Ready(scaffold)
    }
}

impl Debug for Operation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Ready(scaffold) => f.debug_tuple("Ready").field(scaffold).finish(),
            Self::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// Registry of the types and root operations making up a schema.
#[derive(Debug)]
pub struct Manager {
    types: BTreeMap<String, TypeDefinition>,
    queries: BTreeMap<String, Operation>,
    mutations: BTreeMap<String, Operation>,
    implementors: BTreeMap<String, String>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// A manager with the built-in types registered: the `DataObject` interface, `PageInfo` and
    /// `SortDirection`.
    pub fn new() -> Self {
        let mut manager = Self {
            types: Default::default(),
            queries: Default::default(),
            mutations: Default::default(),
            implementors: Default::default(),
        };
        manager.add_type(interface::definition());
        manager.add_type(connection::page_info_type());
        manager.add_type(sort::direction_type());
        manager
    }

    /// Register a type under its own name, replacing any type previously registered by that name.
    pub fn add_type(&mut self, ty: impl Into<TypeDefinition>) {
        let ty = ty.into();
        if self.types.contains_key(ty.name()) {
            tracing::debug!("replacing type {}", ty.name());
        }
        self.types.insert(ty.name().to_string(), ty);
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    /// Register the object type for a record, along with the mapping from its class.
    pub fn add_record(&mut self, record: &RecordDescriptor) {
        self.add_type(object_for_record(record));
        self.add_implementor(record.class(), record.type_name());
    }

    /// Records of `class` resolve to the object type `type_name`.
    pub fn add_implementor(&mut self, class: impl Into<String>, type_name: impl Into<String>) {
        self.implementors.insert(class.into(), type_name.into());
    }

    /// The object type registered for records of `class`.
    pub fn implementor(&self, class: &str) -> Option<&str> {
        self.implementors.get(class).map(String::as_str)
    }

    /// A snapshot of the class mapping, for use by resolvers.
    pub fn type_resolver(&self) -> TypeResolver {
        let objects = self
            .types
            .values()
            .filter(|ty| ty.as_object().is_some())
            .map(|ty| ty.name().to_string())
            .collect();
        TypeResolver::new(self.implementors.clone(), objects)
    }

    /// Register a root query, replacing any query previously registered as `name`.
    pub fn add_query(&mut self, op: impl Into<Operation>, name: impl Into<String>) {
        let name = name.into();
        if self.queries.insert(name.clone(), op.into()).is_some() {
            tracing::debug!("replacing query {name}");
        }
    }

    /// Register a root mutation, replacing any mutation previously registered as `name`.
    pub fn add_mutation(&mut self, op: impl Into<Operation>, name: impl Into<String>) {
        let name = name.into();
        if self.mutations.insert(name.clone(), op.into()).is_some() {
            tracing::debug!("replacing mutation {name}");
        }
    }

    /// The query registered as `name`, if it has been scaffolded.
    ///
    /// Deferred queries are not visible until [`resolve_operations`](Self::resolve_operations).
    pub fn get_query(&self, name: &str) -> Option<&Scaffold> {
        match self.queries.get(name)? {
            Operation::Ready(scaffold) => Some(scaffold),
            Operation::Deferred(_) => None,
        }
    }

    pub fn get_mutation(&self, name: &str) -> Option<&Scaffold> {
        match self.mutations.get(name)? {
            Operation::Ready(scaffold) => Some(scaffold),
            Operation::Deferred(_) => None,
        }
    }

    pub fn query_names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn mutation_names(&self) -> impl Iterator<Item = &str> {
        self.mutations.keys().map(String::as_str)
    }

    /// Scaffold all deferred operations against the types registered so far.
    pub fn resolve_operations(&mut self) -> Result<(), Error> {
        let queries = take(&mut self.queries);
        let mutations = take(&mut self.mutations);
        let queries = self.evaluate(queries);
        let mutations = self.evaluate(mutations);
        self.queries = into_ready(queries?);
        self.mutations = into_ready(mutations?);
        Ok(())
    }

    fn evaluate(&self, ops: BTreeMap<String, Operation>) -> Result<Vec<(String, Scaffold)>, Error> {
        ops.into_iter()
            .map(|(name, op)| Ok((name, op.evaluate(self)?)))
            .collect()
    }

    /// Build the executable schema.
    pub fn finish(mut self) -> Result<Schema, Error> {
        let queries = take(&mut self.queries);
        let queries = self.evaluate(queries)?;
        let mutations = take(&mut self.mutations);
        let mutations = self.evaluate(mutations)?;

        for (_, scaffold) in queries.iter().chain(&mutations) {
            for ty in scaffold.types() {
                self.add_type(ty.clone());
            }
        }
        let resolver = self.type_resolver();
        for (_, scaffold) in queries.iter().chain(&mutations) {
            scaffold.bind_type_resolver(&resolver);
        }

        let mut query = Object::new("Query");
        for (name, scaffold) in &queries {
            query = query.field(scaffold.to_field(name));
        }
        let mutation = (!mutations.is_empty()).then(|| {
            mutations
                .iter()
                .fold(Object::new("Mutation"), |object, (name, scaffold)| {
                    object.field(scaffold.to_field(name))
                })
        });

        let implemented = self
            .types
            .values()
            .filter_map(TypeDefinition::as_object)
            .flat_map(|object| object.interfaces().iter().cloned())
            .collect::<BTreeSet<_>>();

        let mut schema =
            Schema::build("Query", mutation.as_ref().map(|_| "Mutation"), None).register(query);
        if let Some(mutation) = mutation {
            schema = schema.register(mutation);
        }
        for (name, ty) in self.types {
            if ty.is_interface() && !implemented.contains(&name) {
                tracing::debug!("skipping interface {name} with no implementors");
                continue;
            }
            schema = schema.register(ty.into_dynamic());
        }
        tracing::info!(
            "built schema with {} queries and {} mutations",
            queries.len(),
            mutations.len()
        );
        schema.finish().map_err(|err| Error::Schema {
            message: err.to_string(),
        })
    }
}

fn into_ready(ops: Vec<(String, Scaffold)>) -> BTreeMap<String, Operation> {
    ops.into_iter()
        .map(|(name, scaffold)| (name, Operation::Ready(scaffold)))
        .collect()
}
