//! Interfaces to the data store backing the GraphQL API.
//!
//! The scaffolding layer never talks to a persistence engine directly. Each query is given a
//! [`DataSource`], a delegate which turns the query's arguments into an ordered result set, and
//! each mutation a [`Mutate`] delegate. [`MemoryStore`] is a simple in-memory implementation of
//! both, useful for tests and demos.

use crate::{record::Row, Error};
use async_graphql::Value;
use async_std::sync::{Arc, RwLock};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};

/// Arguments of a GraphQL field, keyed by name.
pub type Arguments = BTreeMap<String, Value>;

/// Arguments interpreted by the scaffolding layer itself rather than by the data source.
pub const RESERVED_ARGS: &[&str] = &["limit", "offset", "after", "sortBy"];

/// Per-request information available to resolvers and permission checks.
///
/// Authentication is the host's business; it only needs to put a [`QueryContext`] into the
/// request data. Requests without one are treated as anonymous.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryContext {
    /// The authenticated user making the request, if any.
    pub current_user: Option<String>,
}

impl QueryContext {
    /// A request from an unauthenticated client.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A request on behalf of `user`.
    pub fn user(user: impl Into<String>) -> Self {
        Self {
            current_user: Some(user.into()),
        }
    }
}

/// A delegate which loads the records served by a query.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Load the records matching `args`, in their natural order.
    ///
    /// `parent` is the record owning the field being resolved, or [`None`] for root queries.
    async fn fetch(
        &self,
        parent: Option<&Row>,
        args: &Arguments,
        ctx: &QueryContext,
    ) -> Result<Vec<Row>, Error>;
}

/// A delegate which applies a mutation and returns the affected record.
#[async_trait]
pub trait Mutate: Send + Sync {
    async fn mutate(&self, args: &Arguments, ctx: &QueryContext) -> Result<Option<Row>, Error>;
}

/// A [`DataSource`] backed by a synchronous function of the query arguments.
pub struct FnSource<F>(pub F);

impl<F> Debug for FnSource<F> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("FnSource")
    }
}

#[async_trait]
impl<F> DataSource for FnSource<F>
where
    F: Fn(&Arguments) -> Vec<Row> + Send + Sync,
{
    async fn fetch(
        &self,
        _parent: Option<&Row>,
        args: &Arguments,
        _ctx: &QueryContext,
    ) -> Result<Vec<Row>, Error> {
        Ok((self.0)(args))
    }
}

/// An in-memory record store.
///
/// Records are grouped into tables by class. Cloning the store yields another handle to the same
/// tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    db: Arc<RwLock<Db>>,
}

#[derive(Debug, Default)]
struct Db {
    tables: BTreeMap<String, Vec<Row>>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, assigning it an `id` if it does not have one.
    pub async fn insert(&self, mut row: Row) -> Row {
        let mut db = self.db.write().await;
        match row.id() {
            Some(id) => db.last_id = db.last_id.max(id),
            None => {
                db.last_id += 1;
                row.set("id", db.last_id);
            }
        }
        tracing::debug!("inserting {} {:?}", row.class(), row.id());
        db.tables
            .entry(row.class().to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// All records of `class`, in insertion order.
    pub async fn rows(&self, class: &str) -> Vec<Row> {
        let db = self.db.read().await;
        db.tables.get(class).cloned().unwrap_or_default()
    }

    /// A delegate serving the records of `class`.
    pub fn table(&self, class: impl Into<String>) -> Table {
        Table {
            store: self.clone(),
            class: class.into(),
        }
    }

    /// A delegate serving records of every class, ordered by `id`.
    pub fn all(&self) -> AllTables {
        AllTables {
            store: self.clone(),
        }
    }
}

/// Does `row` have the value given for every filtering argument?
///
/// Null arguments do not filter.
fn matches(row: &Row, args: &Arguments) -> bool {
    args.iter()
        .filter(|(name, value)| {
            !RESERVED_ARGS.contains(&name.as_str()) && !matches!(value, Value::Null)
        })
        .all(|(name, value)| row.get(name) == Some(value))
}

/// The records of one class in a [`MemoryStore`].
#[derive(Clone, Debug)]
pub struct Table {
    store: MemoryStore,
    class: String,
}

#[async_trait]
impl DataSource for Table {
    async fn fetch(
        &self,
        _parent: Option<&Row>,
        args: &Arguments,
        _ctx: &QueryContext,
    ) -> Result<Vec<Row>, Error> {
        let mut rows = self.store.rows(&self.class).await;
        rows.retain(|row| matches(row, args));
        Ok(rows)
    }
}

#[async_trait]
impl Mutate for Table {
    /// Create a record from the mutation's arguments.
    async fn mutate(&self, args: &Arguments, _ctx: &QueryContext) -> Result<Option<Row>, Error> {
        let mut row = Row::new(&self.class);
        for (name, value) in args {
            row.set(name, value.clone());
        }
        Ok(Some(self.store.insert(row).await))
    }
}

/// Every record in a [`MemoryStore`].
#[derive(Clone, Debug)]
pub struct AllTables {
    store: MemoryStore,
}

#[async_trait]
impl DataSource for AllTables {
    async fn fetch(
        &self,
        _parent: Option<&Row>,
        args: &Arguments,
        _ctx: &QueryContext,
    ) -> Result<Vec<Row>, Error> {
        let db = self.store.db.read().await;
        let mut rows = db
            .tables
            .values()
            .flatten()
            .filter(|row| matches(row, args))
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by_key(|row| row.id());
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[async_std::test]
    async fn test_insert_assigns_ids() {
        let store = MemoryStore::new();
        let first = store.insert(Row::new("Post").with("title", "a")).await;
        let explicit = store.insert(Row::new("Post").with("id", 10)).await;
        let next = store.insert(Row::new("Member")).await;
        assert_eq!(first.id(), Some(1));
        assert_eq!(explicit.id(), Some(10));
        assert_eq!(next.id(), Some(11));
        assert_eq!(store.rows("Post").await.len(), 2);
    }

    #[async_std::test]
    async fn test_table_filters_by_argument() {
        let store = MemoryStore::new();
        store.insert(Row::new("Post").with("title", "a")).await;
        store.insert(Row::new("Post").with("title", "b")).await;
        store.insert(Row::new("Member").with("title", "a")).await;

        let args = Arguments::from([
            ("title".to_string(), Value::from("a")),
            ("limit".to_string(), Value::from(1)),
        ]);
        let rows = store
            .table("Post")
            .fetch(None, &args, &QueryContext::anonymous())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id(), Some(1));

        let rows = store
            .all()
            .fetch(None, &args, &QueryContext::anonymous())
            .await
            .unwrap();
        assert_eq!(
            rows.iter().map(|row| row.class()).collect::<Vec<_>>(),
            ["Post", "Member"]
        );
    }

    #[async_std::test]
    async fn test_table_creates_rows() {
        let store = MemoryStore::new();
        let args = Arguments::from([("title".to_string(), Value::from("new"))]);
        let row = store
            .table("Post")
            .mutate(&args, &QueryContext::user("ada"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.class(), "Post");
        assert_eq!(row.id(), Some(1));
        assert_eq!(store.rows("Post").await, [row]);
    }
}
