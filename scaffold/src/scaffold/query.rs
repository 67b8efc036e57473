use super::{
    connection::{self, ConnectionDefinition, Page},
    permission::{AllowAll, PermissionChecker},
    sort, OperationType, Resolve, Resolved, Scaffold,
};
use crate::{
    backend::{Arguments, DataSource, QueryContext, RESERVED_ARGS},
    error::UnknownTypeSnafu,
    record::Row,
    schema::{
        parse_type_ref, ArgumentDefinition, Manager, Operation, TypeDefinition, TypeTagger,
    },
    Error,
};
use async_graphql::dynamic::TypeRef;
use async_trait::async_trait;
use derivative::Derivative;
use derive_more::From;
use serde::Deserialize;
use snafu::OptionExt;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Page size used when a query does not ask for one.
pub const DEFAULT_PAGINATION_LIMIT: usize = 100;

/// Largest page size a query may ask for.
pub const DEFAULT_MAXIMUM_PAGINATION_LIMIT: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
    /// Returns all matching records.
    List,
    /// Returns the first matching record.
    Item,
}

/// Explicit pagination settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
    pub limit: Option<usize>,
    /// Alias of `limit`.
    pub default_limit: Option<usize>,
    pub maximum_limit: Option<usize>,
}

/// Argument of [`QueryScaffolder::set_use_pagination`].
#[derive(Clone, Debug, PartialEq, Eq, From, Deserialize)]
#[serde(untagged)]
pub enum UsePagination {
    /// Turn pagination on or off, keeping the current limits.
    Toggle(bool),
    /// Turn pagination on with the given limits.
    Options(PaginationOptions),
}

/// Builder for a root query over records of one type.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct QueryScaffolder {
    name: String,
    type_name: String,
    kind: QueryKind,
    description: Option<String>,
    args: BTreeMap<String, String>,
    #[derivative(Debug = "ignore")]
    source: Arc<dyn DataSource>,
    paginated: bool,
    limit: usize,
    maximum_limit: usize,
    limit_frozen: bool,
    sortable_fields: Vec<String>,
    #[derivative(Debug = "ignore")]
    permission: Arc<dyn PermissionChecker>,
}

impl QueryScaffolder {
    fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        kind: QueryKind,
        source: impl DataSource + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            kind,
            description: None,
            args: Default::default(),
            source: Arc::new(source),
            paginated: kind == QueryKind::List,
            limit: DEFAULT_PAGINATION_LIMIT,
            maximum_limit: DEFAULT_MAXIMUM_PAGINATION_LIMIT,
            limit_frozen: false,
            sortable_fields: vec![],
            permission: Arc::new(AllowAll),
        }
    }

    /// A query `name` returning a list of `type_name`, paginated by default.
    pub fn list(
        name: impl Into<String>,
        type_name: impl Into<String>,
        source: impl DataSource + 'static,
    ) -> Self {
        Self::new(name, type_name, QueryKind::List, source)
    }

    /// A query `name` returning a single `type_name`, or `null` if nothing matches.
    pub fn item(
        name: impl Into<String>,
        type_name: impl Into<String>,
        source: impl DataSource + 'static,
    ) -> Self {
        Self::new(name, type_name, QueryKind::Item, source)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default page size.
    ///
    /// This has no effect once pagination has been enabled with an explicit limit through
    /// [`set_use_pagination`](Self::set_use_pagination); the explicit limit wins.
    pub fn set_pagination_limit(&mut self, limit: usize) -> &mut Self {
        if self.limit_frozen {
            tracing::debug!(
                "{}: ignoring pagination limit {limit}, already set to {}",
                self.name,
                self.limit
            );
        } else {
            self.limit = limit;
        }
        self
    }

    /// The default page size, capped at the maximum.
    pub fn pagination_limit(&self) -> usize {
        self.limit.min(self.maximum_limit)
    }

    pub fn set_maximum_pagination_limit(&mut self, limit: usize) -> &mut Self {
        self.maximum_limit = limit;
        self
    }

    pub fn maximum_pagination_limit(&self) -> usize {
        self.maximum_limit
    }

    /// Turn pagination on or off, optionally setting its limits.
    ///
    /// Only list queries are paginated. Item queries ignore this setting.
    pub fn set_use_pagination(&mut self, paginate: impl Into<UsePagination>) -> &mut Self {
        if self.kind == QueryKind::Item {
            tracing::debug!("{}: ignoring pagination setting for item query", self.name);
            return self;
        }
        match paginate.into() {
            UsePagination::Toggle(enabled) => self.paginated = enabled,
            UsePagination::Options(options) => {
                if let Some(limit) = options.limit.or(options.default_limit) {
                    self.limit = limit;
                    self.limit_frozen = true;
                }
                if let Some(limit) = options.maximum_limit {
                    self.maximum_limit = limit;
                }
                self.paginated = true;
            }
        }
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.paginated
    }

    /// Add arguments, given as a map from name to GraphQL type, such as `"Int!"`.
    pub fn add_args<I, K, V>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|(name, ty)| (name.into(), ty.into())));
        self
    }

    /// Allow sorting by the given fields.
    pub fn add_sortable_fields<I>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.sortable_fields.contains(&field) {
                self.sortable_fields.push(field);
            }
        }
        self
    }

    pub fn sortable_fields(&self) -> &[String] {
        &self.sortable_fields
    }

    pub fn set_permission_checker(
        &mut self,
        checker: impl PermissionChecker + 'static,
    ) -> &mut Self {
        self.permission = Arc::new(checker);
        self
    }

    /// Apply a declarative configuration map.
    ///
    /// Recognized keys are `sortableFields` (a list of field names), `paginate` (a boolean or an
    /// object with `limit`, `defaultLimit` and `maximumLimit`), `description` and `args` (a map
    /// from argument name to type). Other keys are ignored.
    pub fn apply_config(&mut self, config: &serde_json::Value) -> Result<&mut Self, Error> {
        let config = config
            .as_object()
            .ok_or_else(|| Error::config(&self.name, "configuration must be a map"))?;
        for (key, value) in config {
            match key.as_str() {
                "sortableFields" => {
                    let fields = value
                        .as_array()
                        .ok_or_else(|| Error::config(&self.name, "sortableFields must be an array"))?
                        .iter()
                        .map(|field| {
                            field.as_str().ok_or_else(|| {
                                Error::config(&self.name, "sortableFields must contain strings")
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    self.add_sortable_fields(fields);
                }
                "paginate" => {
                    let paginate = UsePagination::deserialize(value).map_err(|err| {
                        Error::config(&self.name, format!("invalid paginate setting: {err}"))
                    })?;
                    self.set_use_pagination(paginate);
                }
                "description" => {
                    let description = value.as_str().ok_or_else(|| {
                        Error::config(&self.name, "description must be a string")
                    })?;
                    self.set_description(description);
                }
                "args" => {
                    let args = BTreeMap::<String, String>::deserialize(value).map_err(|err| {
                        Error::config(&self.name, format!("invalid args: {err}"))
                    })?;
                    self.add_args(args);
                }
                _ => tracing::debug!("{}: ignoring unknown setting {key}", self.name),
            }
        }
        Ok(self)
    }

    /// Build the operation definition.
    ///
    /// Fails if the target type is not registered with `manager`, or if the configuration is
    /// invalid.
    pub fn scaffold(&self, manager: &Manager) -> Result<Scaffold, Error> {
        let base = manager.get_type(&self.type_name).context(UnknownTypeSnafu {
            name: &self.type_name,
        })?;
        let tagger = base.is_interface().then(TypeTagger::new);

        let mut args = vec![];
        let mut types: Vec<TypeDefinition> = vec![];
        for (name, ty) in &self.args {
            if RESERVED_ARGS.contains(&name.as_str()) {
                return Err(Error::config(
                    &self.name,
                    format!("argument {name} is reserved"),
                ));
            }
            let ty = parse_type_ref(ty).ok_or_else(|| {
                Error::config(&self.name, format!("invalid type {ty:?} for argument {name}"))
            })?;
            args.push(ArgumentDefinition::new(name, ty));
        }

        if !self.sortable_fields.is_empty() {
            if let Some(field) = self
                .sortable_fields
                .iter()
                .find(|field| !matches!(parse_type_ref(field), Some(TypeRef::Named(_))))
            {
                return Err(Error::config(
                    &self.name,
                    format!("invalid sortable field {field:?}"),
                ));
            }
            let (fields, input) = sort::sort_types(&self.name, &self.sortable_fields);
            args.push(
                ArgumentDefinition::new("sortBy", TypeRef::named_nn_list(input.name()))
                    .description("Sort keys, most significant first."),
            );
            types.push(fields.into());
            types.push(input.into());
        }

        let pagination = (self.kind == QueryKind::List && self.paginated)
            .then(|| (self.pagination_limit(), self.maximum_limit));
        let ty = match (self.kind, pagination) {
            (QueryKind::Item, _) => OperationType::Plain(TypeRef::named(&self.type_name)),
            (QueryKind::List, None) => OperationType::Plain(TypeRef::named_list(&self.type_name)),
            (QueryKind::List, Some((limit, maximum_limit))) => {
                let conn = ConnectionDefinition::new(
                    &self.name,
                    &self.type_name,
                    tagger.clone(),
                    limit,
                    maximum_limit,
                );
                args.extend(connection::arguments());
                types.extend(conn.types());
                OperationType::Connection(conn)
            }
        };

        let resolver = QueryResolver {
            operation: self.name.clone(),
            kind: self.kind,
            source: self.source.clone(),
            pagination,
            sortable_fields: self.sortable_fields.clone(),
            permission: self.permission.clone(),
        };
        tracing::debug!("scaffolded query {}: {}", self.name, ty.type_ref());
        Ok(Scaffold::new(
            self.name.clone(),
            self.description.clone(),
            ty,
            args,
            Arc::new(resolver),
        )
        .with_types(types)
        .with_tagger(tagger))
    }

    /// Register this query with `manager`.
    ///
    /// The query is scaffolded when the schema is finished, so its type may be registered later.
    pub fn add_to_manager(self, manager: &mut Manager) {
        let name = self.name.clone();
        manager.add_query(Operation::deferred(move |manager| self.scaffold(manager)), name);
    }
}

struct QueryResolver {
    operation: String,
    kind: QueryKind,
    source: Arc<dyn DataSource>,
    pagination: Option<(usize, usize)>,
    sortable_fields: Vec<String>,
    permission: Arc<dyn PermissionChecker>,
}

#[async_trait]
impl Resolve for QueryResolver {
    async fn resolve(
        &self,
        parent: Option<&Row>,
        args: &Arguments,
        ctx: &QueryContext,
    ) -> Result<Resolved, Error> {
        let mut rows = self
            .source
            .fetch(parent, args, ctx)
            .await
            .map_err(|err| {
                tracing::warn!("{}: {err}", self.operation);
                err
            })?;
        if let Some(sort_by) = args.get("sortBy") {
            let keys = sort::sort_keys(sort_by, &self.sortable_fields);
            sort::sort_rows(&mut rows, &keys);
        }

        let resolved = match (self.kind, self.pagination) {
            (QueryKind::Item, _) => Resolved::Item(rows.into_iter().next()),
            (QueryKind::List, None) => Resolved::List(rows),
            (QueryKind::List, Some((limit, maximum_limit))) => {
                Resolved::Page(connection::paginate(rows, args, limit, maximum_limit)?)
            }
        };
        if self.permission.check_permission(ctx, resolved.rows()) {
            return Ok(resolved);
        }

        tracing::debug!("{}: permission denied", self.operation);
        Ok(match resolved {
            Resolved::List(_) => Resolved::List(vec![]),
            Resolved::Page(_) => Resolved::Page(Page::empty()),
            Resolved::Item(_) => Resolved::Item(None),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        backend::{FnSource, MemoryStore},
        record::{FieldDescriptor, FieldKind, RecordDescriptor},
        scaffold::{connection::encode_cursor, DenyAll},
        schema::{FieldDefinition, ObjectDefinition},
    };
    use async_graphql::{Request, Value, Variables};
    use serde_json::json;

    fn foo_bar() -> FnSource<impl Fn(&Arguments) -> Vec<Row> + Send + Sync> {
        FnSource(|_: &Arguments| vec![Row::new("test").with("Foo", "Bar")])
    }

    fn manager() -> Manager {
        let mut manager = Manager::new();
        manager.add_type(ObjectDefinition::new(
            "test",
            vec![FieldDefinition::property(
                "Foo",
                TypeRef::named(TypeRef::STRING),
            )],
        ));
        manager
    }

    #[test]
    fn test_pagination_limit() {
        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        assert_eq!(query.pagination_limit(), 100);
        assert_eq!(query.maximum_pagination_limit(), 100);

        query.set_pagination_limit(200);
        assert_eq!(query.pagination_limit(), 100);

        query.set_maximum_pagination_limit(25);
        assert_eq!(query.pagination_limit(), 25);

        query.set_pagination_limit(10);
        assert_eq!(query.pagination_limit(), 10);
    }

    #[test]
    fn test_explicit_limit_freezes_pagination_limit() {
        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        query.set_use_pagination(PaginationOptions {
            limit: Some(20),
            ..Default::default()
        });
        assert_eq!(query.pagination_limit(), 20);

        // Ignored: pagination was enabled with an explicit limit.
        query.set_pagination_limit(50);
        assert_eq!(query.pagination_limit(), 20);

        // The maximum is always effective.
        query.set_maximum_pagination_limit(10);
        assert_eq!(query.pagination_limit(), 10);
        assert_eq!(query.maximum_pagination_limit(), 10);
    }

    #[test]
    fn test_toggle_pagination_keeps_limit_adjustable() {
        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        query.set_use_pagination(false).set_use_pagination(true);
        query.set_pagination_limit(50);
        assert_eq!(query.pagination_limit(), 50);
    }

    #[test]
    fn test_apply_config() {
        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        query
            .apply_config(&json!({
                "sortableFields": ["Foo", "id"],
                "paginate": { "defaultLimit": 5, "maximumLimit": 10 },
                "description": "Read tests.",
                "args": { "Foo": "String" },
                "somethingElse": 1,
            }))
            .unwrap();
        assert_eq!(query.sortable_fields(), ["Foo", "id"]);
        assert!(query.is_paginated());
        assert_eq!(query.pagination_limit(), 5);
        assert_eq!(query.maximum_pagination_limit(), 10);

        let scaffold = query.scaffold(&manager()).unwrap();
        assert_eq!(scaffold.doc(), Some("Read tests."));
        assert_eq!(scaffold.arg("Foo").unwrap().ty().to_string(), "String");

        query.apply_config(&json!({ "paginate": false })).unwrap();
        assert!(!query.is_paginated());
    }

    #[test]
    fn test_apply_config_errors() {
        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        let err = query
            .apply_config(&json!({ "sortableFields": "not-a-list" }))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(
            err.to_string().contains("sortableFields must be an array"),
            "{err}"
        );

        let err = query.apply_config(&json!({ "paginate": 10 })).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[async_std::test]
    async fn test_scaffold_unpaginated() {
        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        query.set_use_pagination(false).set_description("A test query.");
        let scaffold = query.scaffold(&manager()).unwrap();

        assert_eq!(scaffold.name(), "testQuery");
        assert_eq!(scaffold.doc(), Some("A test query."));
        assert!(scaffold.args().is_empty());
        assert_eq!(scaffold.ty().type_ref().to_string(), "[test]");
        assert_eq!(scaffold.ty().base_type(), "test");

        let result = scaffold
            .resolve(None, &Arguments::new(), &QueryContext::anonymous())
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.first().unwrap().get("Foo"), Some(&Value::from("Bar")));
    }

    #[async_std::test]
    async fn test_scaffold_paginated() {
        let query = QueryScaffolder::list("testQuery", "test", foo_bar());
        let scaffold = query.scaffold(&manager()).unwrap();

        assert_eq!(scaffold.ty().name(), "testQueryConnection");
        let conn = scaffold.ty().as_connection().unwrap();
        assert!(!conn.fields().is_evaluated());
        assert!(conn.fields().contains("pageInfo"));
        assert!(conn.fields().contains("edges"));
        for arg in ["limit", "offset", "after"] {
            assert!(scaffold.arg(arg).is_some(), "{arg}");
        }
        assert!(scaffold.arg("sortBy").is_none());

        let Resolved::Page(page) = scaffold
            .resolve(None, &Arguments::new(), &QueryContext::anonymous())
            .await
            .unwrap()
        else {
            panic!("expected a page");
        };
        assert_eq!(page.total_count(), 1);
        assert_eq!(page.rows()[0].get("Foo"), Some(&Value::from("Bar")));
    }

    #[async_std::test]
    async fn test_permission_checker() {
        let ctx = QueryContext::anonymous();
        for paginate in [false, true] {
            let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
            query.set_use_pagination(paginate);
            let allowed = query.scaffold(&manager()).unwrap();
            let res = allowed.resolve(None, &Arguments::new(), &ctx).await.unwrap();
            assert_eq!(res.len(), 1);

            query.set_permission_checker(|_: &QueryContext, _: &[Row]| true);
            let res = query
                .scaffold(&manager())
                .unwrap()
                .resolve(None, &Arguments::new(), &ctx)
                .await
                .unwrap();
            assert_eq!(res.len(), 1);

            query.set_permission_checker(DenyAll);
            let res = query
                .scaffold(&manager())
                .unwrap()
                .resolve(None, &Arguments::new(), &ctx)
                .await
                .unwrap();
            assert!(res.is_empty());
            assert!(res.first().is_none());
            match res {
                Resolved::List(rows) => assert!(!paginate && rows.is_empty()),
                Resolved::Page(page) => assert!(paginate && page.total_count() == 0),
                Resolved::Item(_) => panic!("list query resolved to an item"),
            }
        }
    }

    #[async_std::test]
    async fn test_item_query() {
        let store = MemoryStore::new();
        for title in ["a", "b"] {
            store.insert(Row::new("test").with("Foo", title)).await;
        }
        let mut query = QueryScaffolder::item("readOneTest", "test", store.table("test"));
        query.add_args([("id", "Int!")]).set_use_pagination(true);
        assert!(!query.is_paginated());
        let scaffold = query.scaffold(&manager()).unwrap();
        assert_eq!(scaffold.ty().type_ref().to_string(), "test");
        assert_eq!(scaffold.arg("id").unwrap().ty().to_string(), "Int!");

        let args = Arguments::from([("id".to_string(), Value::from(2))]);
        let res = scaffold
            .resolve(None, &args, &QueryContext::anonymous())
            .await
            .unwrap();
        assert_eq!(res.first().unwrap().get("Foo"), Some(&Value::from("b")));

        let args = Arguments::from([("id".to_string(), Value::from(3))]);
        let res = scaffold
            .resolve(None, &args, &QueryContext::anonymous())
            .await
            .unwrap();
        assert_eq!(res, Resolved::Item(None));

        query.set_permission_checker(DenyAll);
        let args = Arguments::from([("id".to_string(), Value::from(1))]);
        let res = query
            .scaffold(&manager())
            .unwrap()
            .resolve(None, &args, &QueryContext::anonymous())
            .await
            .unwrap();
        assert_eq!(res, Resolved::Item(None));
    }

    #[test]
    fn test_scaffold_errors() {
        let query = QueryScaffolder::list("testQuery", "missing", foo_bar());
        assert_eq!(
            query.scaffold(&manager()).unwrap_err(),
            Error::UnknownType {
                name: "missing".into()
            }
        );

        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        query.add_args([("Foo", "Str ing")]);
        assert!(matches!(
            query.scaffold(&manager()),
            Err(Error::Configuration { .. })
        ));

        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        query.add_args([("limit", "Int")]);
        assert!(matches!(
            query.scaffold(&manager()),
            Err(Error::Configuration { .. })
        ));

        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        query.add_sortable_fields(["not a field"]);
        assert!(matches!(
            query.scaffold(&manager()),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_add_args_overwrites() {
        let mut query = QueryScaffolder::list("testQuery", "test", foo_bar());
        query.add_args([("Foo", "String"), ("Bar", "Int")]);
        query.add_args([("Foo", "ID!")]);
        query.set_use_pagination(false);
        let scaffold = query.scaffold(&manager()).unwrap();
        assert_eq!(
            scaffold
                .args()
                .iter()
                .map(|arg| format!("{}: {}", arg.name(), arg.ty()))
                .collect::<Vec<_>>(),
            ["Bar: Int", "Foo: ID!"]
        );
    }

    fn post() -> RecordDescriptor {
        RecordDescriptor::new("App.Post", "Post")
            .field(FieldDescriptor::new("title", FieldKind::String))
            .field(FieldDescriptor::new("rating", FieldKind::Int))
    }

    async fn posts() -> MemoryStore {
        let store = MemoryStore::new();
        for (title, rating) in [("c", 3), ("a", 5), ("b", 4), ("d", 1), ("e", 2)] {
            store
                .insert(
                    Row::new("App.Post")
                        .with("title", title)
                        .with("rating", rating),
                )
                .await;
        }
        store
    }

    #[async_std::test]
    async fn test_connection_end_to_end() {
        let store = posts().await;
        let mut manager = Manager::new();
        manager.add_record(&post());
        let mut query = QueryScaffolder::list("readPosts", "Post", store.table("App.Post"));
        query
            .add_sortable_fields(["title", "rating"])
            .set_pagination_limit(2);
        query.add_to_manager(&mut manager);
        let schema = manager.finish().unwrap();

        let doc = r#"
            query ($after: String) {
                readPosts(sortBy: [{ field: rating, direction: DESC }], after: $after) {
                    edges { cursor node { id title } }
                    pageInfo { hasNextPage hasPreviousPage totalCount }
                }
            }
        "#;
        let res = schema.execute(doc).await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data.into_json().unwrap(),
            json!({
                "readPosts": {
                    "edges": [
                        { "cursor": encode_cursor(0), "node": { "id": 2, "title": "a" } },
                        { "cursor": encode_cursor(1), "node": { "id": 3, "title": "b" } },
                    ],
                    "pageInfo": { "hasNextPage": true, "hasPreviousPage": false, "totalCount": 5 },
                }
            })
        );

        // Resume from the last cursor of the first page.
        let res = schema
            .execute(
                Request::new(doc).variables(Variables::from_json(json!({
                    "after": encode_cursor(1),
                }))),
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data.into_json().unwrap()["readPosts"]["edges"],
            json!([
                { "cursor": encode_cursor(2), "node": { "id": 1, "title": "c" } },
                { "cursor": encode_cursor(3), "node": { "id": 5, "title": "e" } },
            ])
        );

        let res = schema
            .execute(r#"{ readPosts(after: "garbage") { edges { cursor } } }"#)
            .await;
        assert_eq!(res.errors.len(), 1);
    }

    struct Unreachable;

    #[async_trait]
    impl DataSource for Unreachable {
        async fn fetch(
            &self,
            _parent: Option<&Row>,
            _args: &Arguments,
            _ctx: &QueryContext,
        ) -> Result<Vec<Row>, Error> {
            Err(Error::fetch("readBroken", "connection refused"))
        }
    }

    #[async_std::test]
    async fn test_fetch_error_is_confined_to_field() {
        let mut manager = manager();
        let mut broken = QueryScaffolder::list("readBroken", "test", Unreachable);
        broken.set_use_pagination(false);
        broken.add_to_manager(&mut manager);
        let mut working = QueryScaffolder::list("readTest", "test", foo_bar());
        working.set_use_pagination(false);
        working.add_to_manager(&mut manager);
        let schema = manager.finish().unwrap();

        let res = schema
            .execute("{ readBroken { Foo } readTest { Foo } }")
            .await;
        assert_eq!(res.errors.len(), 1);
        assert_eq!(
            res.errors[0].message,
            "failed to fetch readBroken: connection refused"
        );
        let data = res.data.into_json().unwrap();
        assert!(data["readBroken"].is_null(), "{data}");
        assert_eq!(data["readTest"], json!([{ "Foo": "Bar" }]));
    }

    #[async_std::test]
    async fn test_interface_query_end_to_end() {
        let store = posts().await;
        store.insert(Row::new("App.Member").with("name", "ada")).await;
        let mut manager = Manager::new();
        manager.add_record(&post());
        manager.add_record(
            &RecordDescriptor::new("App.Member", "Member")
                .field(FieldDescriptor::new("name", FieldKind::String)),
        );
        let mut query = QueryScaffolder::list("dataObjects", "DataObject", store.all());
        query.set_use_pagination(false);
        query.add_to_manager(&mut manager);
        let schema = manager.finish().unwrap();

        let res = schema
            .execute(
                "{ dataObjects { __typename id ... on Member { name } ... on Post { rating } } }",
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        let data = res.data.into_json().unwrap();
        let objects = data["dataObjects"].as_array().unwrap();
        assert_eq!(objects.len(), 6);
        assert_eq!(objects[0], json!({ "__typename": "Post", "id": 1, "rating": 3 }));
        assert_eq!(objects[5], json!({ "__typename": "Member", "id": 6, "name": "ada" }));
    }
}
