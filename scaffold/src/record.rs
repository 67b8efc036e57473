//! Persistent records and the metadata describing them.
//!
//! A [`Row`] is the runtime form of a record: the identifier of its class and a map of GraphQL
//! values keyed by field name. A [`RecordDescriptor`] is its static form: the fields a record of a
//! given class declares, which the [schema manager](crate::schema::Manager) uses to synthesize an
//! object type.

use async_graphql::{dynamic::TypeRef, Number, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::{Display, EnumString};

/// A record type which can describe itself to the schema.
///
/// This is normally derived with `#[derive(Record)]`.
pub trait Record {
    /// Static metadata for this record type.
    fn descriptor() -> RecordDescriptor;

    /// Convert this record into its runtime representation.
    fn into_row(self) -> Row;
}

/// A Rust type which can be stored in a field of a [`Record`].
pub trait RecordField {
    /// The GraphQL scalar this type maps to.
    fn kind() -> FieldKind;

    /// Whether a missing value is allowed.
    fn nullable() -> bool {
        false
    }

    /// Convert a value of this type into a GraphQL value.
    fn into_value(self) -> Value;
}

macro_rules! int_field {
    ($($t:ty),+) => {
        $(
            impl RecordField for $t {
                fn kind() -> FieldKind {
                    FieldKind::Int
                }

                fn into_value(self) -> Value {
                    Value::Number(Number::from(self))
                }
            }
        )+
    }
}

int_field!(i8, i16, i32, i64, u8, u16, u32, u64);

impl RecordField for f32 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    fn into_value(self) -> Value {
        f64::from(self).into_value()
    }
}

impl RecordField for f64 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    fn into_value(self) -> Value {
        // GraphQL has no representation for NaN or infinities.
        Number::from_f64(self).map_or(Value::Null, Value::Number)
    }
}

impl RecordField for bool {
    fn kind() -> FieldKind {
        FieldKind::Boolean
    }

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl RecordField for String {
    fn kind() -> FieldKind {
        FieldKind::String
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl<T: RecordField> RecordField for Option<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn nullable() -> bool {
        true
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }
}

/// The GraphQL scalar used to expose a record field.
///
/// The string forms accepted by [`FromStr`] are the declared storage types of record fields, so
/// that a field declared as `Varchar(255)` or `ForeignKey` maps to the right scalar (see
/// [`FieldKind::from_declared`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FieldKind {
    #[strum(
        to_string = "Int",
        serialize = "BigInt",
        serialize = "ForeignKey",
        serialize = "PrimaryKey"
    )]
    Int,
    #[strum(
        to_string = "Float",
        serialize = "Decimal",
        serialize = "Double",
        serialize = "Currency",
        serialize = "Percentage"
    )]
    Float,
    #[strum(to_string = "Boolean")]
    Boolean,
    #[strum(
        to_string = "String",
        serialize = "Varchar",
        serialize = "Text",
        serialize = "HTMLText",
        serialize = "HTMLVarchar",
        serialize = "Enum",
        serialize = "Date",
        serialize = "Datetime",
        serialize = "Time"
    )]
    String,
    #[strum(to_string = "ID")]
    Id,
}

impl FieldKind {
    /// Map a declared storage type to a scalar.
    ///
    /// Type parameters, as in `Varchar(255)`, are ignored. Unknown declared types are exposed as
    /// strings.
    pub fn from_declared(declared: &str) -> Self {
        let base = declared.split('(').next().unwrap_or_default().trim();
        Self::from_str(base).unwrap_or_else(|_| {
            tracing::debug!("unknown declared type {declared}, exposing it as String");
            Self::String
        })
    }

    /// The name of the GraphQL scalar.
    pub fn scalar(self) -> &'static str {
        match self {
            Self::Int => TypeRef::INT,
            Self::Float => TypeRef::FLOAT,
            Self::Boolean => TypeRef::BOOLEAN,
            Self::String => TypeRef::STRING,
            Self::Id => TypeRef::ID,
        }
    }
}

/// A field declared by a record type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    nullable: bool,
    description: Option<String>,
}

impl FieldDescriptor {
    /// A non-nullable field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            description: None,
        }
    }

    /// A field described by its declared storage type, e.g. `Varchar(255)`.
    pub fn declared(name: impl Into<String>, declared: &str) -> Self {
        Self::new(name, FieldKind::from_declared(declared))
    }

    /// Set whether the field is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Attach documentation to the field.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn doc(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The GraphQL type of this field.
    pub fn type_ref(&self) -> TypeRef {
        if self.nullable {
            TypeRef::named(self.kind.scalar())
        } else {
            TypeRef::named_nn(self.kind.scalar())
        }
    }
}

/// Static metadata for a record type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDescriptor {
    class: String,
    type_name: String,
    description: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    /// Describe records of `class`, exposed in the schema as `type_name`.
    pub fn new(class: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            type_name: type_name.into(),
            description: None,
            fields: vec![],
        }
    }

    /// Attach documentation to the record type.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// The identifier of the record class, as carried by its [`Row`]s.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The name of the object type synthesized for this record.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn doc(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// A record at runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    class: String,
    fields: BTreeMap<String, Value>,
}

impl Row {
    /// An empty record of `class`.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: Default::default(),
        }
    }

    /// Set a field, consuming and returning the row.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The record's integer identifier, if it has one.
    pub fn id(&self) -> Option<i64> {
        match self.fields.get("id") {
            Some(Value::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}
