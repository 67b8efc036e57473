//! Build-time definitions of schema types.
//!
//! These mirror the types of [`async_graphql::dynamic`], with two differences that matter while
//! the schema is being assembled: they can be inspected (names, fields) and cloned, and the field
//! set of an object or interface can be _deferred_, produced only when first needed. Deferred
//! fields let two types refer to each other regardless of which is registered first.

use crate::record::Row;
use async_graphql::{
    dynamic::{
        self, Enum, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
        InterfaceField, Object, ResolverContext, TypeRef,
    },
    Value,
};
use derivative::Derivative;
use derive_more::From;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, OnceLock};

/// A field resolver, as accepted by [`dynamic::Field::new`].
pub type ResolverFn = Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

/// An argument of a field.
#[derive(Clone, Debug)]
pub struct ArgumentDefinition {
    name: String,
    ty: TypeRef,
    description: Option<String>,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub(crate) fn to_dynamic(&self) -> InputValue {
        let mut input = InputValue::new(&self.name, self.ty.clone());
        if let Some(description) = &self.description {
            input = input.description(description);
        }
        input
    }
}

/// A field of an object or interface type.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct FieldDefinition {
    name: String,
    ty: TypeRef,
    description: Option<String>,
    args: Vec<ArgumentDefinition>,
    #[derivative(Debug = "ignore")]
    resolve: Option<ResolverFn>,
}

impl FieldDefinition {
    /// A field resolved by `resolve`.
    pub fn new<F>(name: impl Into<String>, ty: impl Into<TypeRef>, resolve: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        Self {
            resolve: Some(Arc::new(resolve)),
            ..Self::declared(name, ty)
        }
    }

    /// A field with no resolver, as declared by an interface.
    pub fn declared(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: None,
            args: vec![],
            resolve: None,
        }
    }

    /// A field read from the property of the same name of the parent [`Row`].
    ///
    /// Missing properties and explicit nulls both resolve to `null`.
    pub fn property(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        let name = name.into();
        let key = name.clone();
        Self::new(name, ty, move |ctx| {
            let key = key.clone();
            FieldFuture::new(async move {
                let row = ctx.parent_value.try_downcast_ref::<Row>()?;
                Ok(match row.get(&key) {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(FieldValue::value(value.clone())),
                })
            })
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, arg: ArgumentDefinition) -> Self {
        self.args.push(arg);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn doc(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn args(&self) -> &[ArgumentDefinition] {
        &self.args
    }

    pub(crate) fn to_dynamic(&self) -> Field {
        let resolve = self.resolve.clone();
        let mut field = Field::new(&self.name, self.ty.clone(), move |ctx| match &resolve {
            Some(resolve) => (**resolve)(ctx),
            None => FieldFuture::new(async move { Ok(None::<FieldValue>) }),
        });
        if let Some(description) = &self.description {
            field = field.description(description);
        }
        for arg in &self.args {
            field = field.argument(arg.to_dynamic());
        }
        field
    }

    fn to_interface_field(&self) -> InterfaceField {
        let mut field = InterfaceField::new(&self.name, self.ty.clone());
        if let Some(description) = &self.description {
            field = field.description(description);
        }
        for arg in &self.args {
            field = field.argument(arg.to_dynamic());
        }
        field
    }
}

/// The field set of an object or interface type, possibly computed on first access.
#[derive(Clone)]
pub struct Fields(Arc<LazyFields>);

type Producer = Box<dyn Fn() -> Vec<FieldDefinition> + Send + Sync>;

struct LazyFields {
    producer: Option<Producer>,
    cell: OnceLock<Vec<FieldDefinition>>,
}

impl Fields {
    /// A field set known up front.
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self(Arc::new(LazyFields {
            producer: None,
            cell: OnceLock::from(fields),
        }))
    }

    /// A field set computed by `producer` the first time it is accessed.
    pub fn lazy(producer: impl Fn() -> Vec<FieldDefinition> + Send + Sync + 'static) -> Self {
        Self(Arc::new(LazyFields {
            producer: Some(Box::new(producer)),
            cell: OnceLock::new(),
        }))
    }

    /// The fields, computing them if necessary.
    pub fn get(&self) -> &[FieldDefinition] {
        self.0.cell.get_or_init(|| match &self.0.producer {
            Some(producer) => producer(),
            None => vec![],
        })
    }

    /// Have the fields been computed yet?
    pub fn is_evaluated(&self) -> bool {
        self.0.cell.get().is_some()
    }

    pub fn find(&self, name: &str) -> Option<&FieldDefinition> {
        self.get().iter().find(|f| f.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

impl Debug for Fields {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.0.cell.get() {
            Some(fields) => f.debug_list().entries(fields.iter().map(|f| f.name())).finish(),
            None => f.write_str("<deferred>"),
        }
    }
}

impl From<Vec<FieldDefinition>> for Fields {
    fn from(fields: Vec<FieldDefinition>) -> Self {
        Self::new(fields)
    }
}

/// An object type.
#[derive(Clone, Debug)]
pub struct ObjectDefinition {
    name: String,
    description: Option<String>,
    interfaces: Vec<String>,
    fields: Fields,
}

impl ObjectDefinition {
    pub fn new(name: impl Into<String>, fields: impl Into<Fields>) -> Self {
        Self {
            name: name.into(),
            description: None,
            interfaces: vec![],
            fields: fields.into(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare that this object implements `interface`.
    pub fn implement(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    fn into_dynamic(self) -> Object {
        let mut object = Object::new(&self.name);
        if let Some(description) = &self.description {
            object = object.description(description);
        }
        for interface in &self.interfaces {
            object = object.implement(interface);
        }
        for field in self.fields.get() {
            object = object.field(field.to_dynamic());
        }
        object
    }
}

/// An interface type.
#[derive(Clone, Debug)]
pub struct InterfaceDefinition {
    name: String,
    description: Option<String>,
    fields: Fields,
}

impl InterfaceDefinition {
    pub fn new(name: impl Into<String>, fields: impl Into<Fields>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: fields.into(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    fn into_dynamic(self) -> Interface {
        let mut interface = Interface::new(&self.name);
        if let Some(description) = &self.description {
            interface = interface.description(description);
        }
        for field in self.fields.get() {
            interface = interface.field(field.to_interface_field());
        }
        interface
    }
}

/// An enum type.
#[derive(Clone, Debug)]
pub struct EnumDefinition {
    name: String,
    description: Option<String>,
    items: Vec<String>,
}

impl EnumDefinition {
    pub fn new<I>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    fn into_dynamic(self) -> Enum {
        let mut ty = Enum::new(&self.name);
        if let Some(description) = &self.description {
            ty = ty.description(description);
        }
        for item in self.items {
            ty = ty.item(item);
        }
        ty
    }
}

/// An input object type.
#[derive(Clone, Debug)]
pub struct InputDefinition {
    name: String,
    description: Option<String>,
    fields: Vec<ArgumentDefinition>,
}

impl InputDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<ArgumentDefinition>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[ArgumentDefinition] {
        &self.fields
    }

    fn into_dynamic(self) -> InputObject {
        let mut input = InputObject::new(&self.name);
        if let Some(description) = &self.description {
            input = input.description(description);
        }
        for field in &self.fields {
            input = input.field(field.to_dynamic());
        }
        input
    }
}

/// Any type which can be registered with the [`Manager`](super::Manager).
#[derive(Clone, Debug, From)]
pub enum TypeDefinition {
    Object(ObjectDefinition),
    Interface(InterfaceDefinition),
    Enum(EnumDefinition),
    Input(InputDefinition),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            Self::Object(ty) => ty.name(),
            Self::Interface(ty) => ty.name(),
            Self::Enum(ty) => ty.name(),
            Self::Input(ty) => ty.name(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectDefinition> {
        match self {
            Self::Object(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceDefinition> {
        match self {
            Self::Interface(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.as_interface().is_some()
    }

    pub(crate) fn into_dynamic(self) -> dynamic::Type {
        match self {
            Self::Object(ty) => dynamic::Type::Object(ty.into_dynamic()),
            Self::Interface(ty) => dynamic::Type::Interface(ty.into_dynamic()),
            Self::Enum(ty) => dynamic::Type::Enum(ty.into_dynamic()),
            Self::Input(ty) => dynamic::Type::InputObject(ty.into_dynamic()),
        }
    }
}

/// The name of the named type at the core of `ty`, stripped of list and non-null wrappers.
pub fn named_type(ty: &TypeRef) -> &str {
    match ty {
        TypeRef::Named(name) => &**name,
        TypeRef::NonNull(inner) | TypeRef::List(inner) => named_type(inner),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_lazy_fields_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fields = Fields::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![FieldDefinition::property("title", TypeRef::named(TypeRef::STRING))]
        });
        let object = ObjectDefinition::new("Post", fields);

        assert!(!object.fields().is_evaluated());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(object.fields().contains("title"));
        assert!(object.clone().fields().contains("title"));
        assert!(object.fields().is_evaluated());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_named_type() {
        let ty = TypeRef::named_nn_list_nn("Post");
        assert_eq!(ty.to_string(), "[Post!]!");
        assert_eq!(named_type(&ty), "Post");
    }

    #[test]
    fn test_type_definition_name() {
        let ty = TypeDefinition::from(EnumDefinition::new("SortDirection", ["ASC", "DESC"]));
        assert_eq!(ty.name(), "SortDirection");
        assert!(ty.as_object().is_none());
    }
}
