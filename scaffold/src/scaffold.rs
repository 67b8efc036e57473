//! Scaffolding of executable operations from declarative configuration.
//!
//! A scaffolder ([`QueryScaffolder`], [`MutationScaffolder`]) is a mutable builder. Once it is
//! configured, [`scaffold`](QueryScaffolder::scaffold) freezes it into a [`Scaffold`]: an immutable
//! operation definition holding the operation's name, result type, arguments and resolver, along
//! with any auxiliary types (connections, sort inputs) the operation needs.

pub mod connection;
pub mod mutation;
pub mod permission;
pub mod query;
pub mod sort;

pub use connection::{ConnectionDefinition, Edge, Page, PageInfo};
pub use mutation::MutationScaffolder;
pub use permission::{AllowAll, DenyAll, OwnedBy, PermissionChecker, RequireUser};
pub use query::{PaginationOptions, QueryKind, QueryScaffolder, UsePagination};

use crate::{
    backend::{Arguments, QueryContext},
    record::Row,
    schema::{
        named_type, ArgumentDefinition, TypeDefinition, TypeResolver, TypeTagger,
    },
    Error,
};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, ResolverContext, TypeRef};
use async_trait::async_trait;
use derivative::Derivative;
use std::sync::Arc;

/// The resolver of a scaffolded operation.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(
        &self,
        parent: Option<&Row>,
        args: &Arguments,
        ctx: &QueryContext,
    ) -> Result<Resolved, Error>;
}

/// The result of resolving an operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    /// The records of an unpaginated list.
    List(Vec<Row>),
    /// One page of a paginated list.
    Page(Page),
    /// A single record, or nothing.
    Item(Option<Row>),
}

impl Resolved {
    /// The records disclosed by this result.
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::List(rows) => rows,
            Self::Page(page) => page.rows(),
            Self::Item(Some(row)) => std::slice::from_ref(row),
            Self::Item(None) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows().first()
    }

    fn into_field_value<'a>(self, tagger: Option<&TypeTagger>) -> Option<FieldValue<'a>> {
        let wrap = |row: Row| match tagger {
            Some(tagger) => tagger.tag(row),
            None => FieldValue::owned_any(row),
        };
        match self {
            Self::List(rows) => Some(FieldValue::list(rows.into_iter().map(wrap))),
            Self::Page(page) => Some(FieldValue::owned_any(page)),
            Self::Item(row) => row.map(wrap),
        }
    }
}

/// The result type of a scaffolded operation.
#[derive(Clone, Debug)]
pub enum OperationType {
    /// A plain type: a single record or a list of records.
    Plain(TypeRef),
    /// A paginated connection.
    Connection(ConnectionDefinition),
}

impl OperationType {
    /// The name of the type exposed by the operation.
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(ty) => named_type(ty),
            Self::Connection(conn) => conn.name(),
        }
    }

    /// The record type wrapped by this type.
    pub fn base_type(&self) -> &str {
        match self {
            Self::Plain(ty) => named_type(ty),
            Self::Connection(conn) => conn.node_type(),
        }
    }

    pub fn as_connection(&self) -> Option<&ConnectionDefinition> {
        match self {
            Self::Connection(conn) => Some(conn),
            Self::Plain(_) => None,
        }
    }

    pub fn type_ref(&self) -> TypeRef {
        match self {
            Self::Plain(ty) => ty.clone(),
            Self::Connection(conn) => TypeRef::named_nn(conn.name()),
        }
    }
}

/// An immutable, executable operation definition.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Scaffold {
    name: String,
    description: Option<String>,
    ty: OperationType,
    args: Vec<ArgumentDefinition>,
    #[derivative(Debug = "ignore")]
    resolve: Arc<dyn Resolve>,
    types: Vec<TypeDefinition>,
    tagger: Option<TypeTagger>,
}

impl Scaffold {
    pub(crate) fn new(
        name: String,
        description: Option<String>,
        ty: OperationType,
        args: Vec<ArgumentDefinition>,
        resolve: Arc<dyn Resolve>,
    ) -> Self {
        Self {
            name,
            description,
            ty,
            args,
            resolve,
            types: vec![],
            tagger: None,
        }
    }

    /// Types which must be registered alongside this operation.
    pub(crate) fn with_types(mut self, types: Vec<TypeDefinition>) -> Self {
        self.types = types;
        self
    }

    /// Tag returned records with their concrete type, for operations returning an interface.
    pub(crate) fn with_tagger(mut self, tagger: Option<TypeTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    /// Bind the class mapping used to tag records returned through an interface.
    pub(crate) fn bind_type_resolver(&self, resolver: &TypeResolver) {
        if let Some(tagger) = &self.tagger {
            tagger.bind(resolver);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn ty(&self) -> &OperationType {
        &self.ty
    }

    pub fn args(&self) -> &[ArgumentDefinition] {
        &self.args
    }

    pub fn arg(&self, name: &str) -> Option<&ArgumentDefinition> {
        self.args.iter().find(|arg| arg.name() == name)
    }

    /// Auxiliary types required by this operation.
    pub fn types(&self) -> &[TypeDefinition] {
        &self.types
    }

    /// Invoke the resolver directly.
    pub async fn resolve(
        &self,
        parent: Option<&Row>,
        args: &Arguments,
        ctx: &QueryContext,
    ) -> Result<Resolved, Error> {
        self.resolve.resolve(parent, args, ctx).await
    }

    /// The root field exposing this operation as `name`.
    pub(crate) fn to_field(&self, name: &str) -> Field {
        let resolve = self.resolve.clone();
        let tagger = self.tagger.clone();
        let mut field = Field::new(name, self.ty.type_ref(), move |ctx| {
            let resolve = resolve.clone();
            let tagger = tagger.clone();
            FieldFuture::new(async move {
                let parent = ctx.parent_value.try_downcast_ref::<Row>().ok();
                let args = arguments(&ctx);
                let query_ctx = ctx.data_opt::<QueryContext>().cloned().unwrap_or_default();
                let resolved = resolve.resolve(parent, &args, &query_ctx).await?;
                Ok(resolved.into_field_value(tagger.as_ref()))
            })
        });
        if let Some(description) = &self.description {
            field = field.description(description);
        }
        for arg in &self.args {
            field = field.argument(arg.to_dynamic());
        }
        field
    }
}

/// Collect the arguments of the field being resolved.
fn arguments(ctx: &ResolverContext) -> Arguments {
    ctx.args
        .iter()
        .map(|(name, value)| (name.to_string(), value.as_value().clone()))
        .collect()
}
