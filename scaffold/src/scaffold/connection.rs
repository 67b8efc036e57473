//! Paginated connections.
//!
//! A paginated list query returns a connection object wrapping one page of results: `edges`, each
//! holding a record (`node`) and an opaque `cursor` identifying its position, and `pageInfo`
//! describing where the page sits in the full result set.

use crate::{
    backend::Arguments,
    record::Row,
    schema::{
        interface::TypeTagger, ArgumentDefinition, FieldDefinition, Fields, ObjectDefinition,
        TypeDefinition,
    },
    Error,
};
use async_graphql::{
    dynamic::{FieldFuture, FieldValue, TypeRef},
    Number, Value,
};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Name of the object type describing a page.
pub const PAGE_INFO: &str = "PageInfo";

const CURSOR_PREFIX: &str = "arrayconnection:";

/// The opaque cursor for the record at `index` in the full result set.
pub fn encode_cursor(index: usize) -> String {
    STANDARD.encode(format!("{CURSOR_PREFIX}{index}"))
}

/// The index in the full result set identified by `cursor`.
pub fn decode_cursor(cursor: &str) -> Result<usize, Error> {
    let invalid = || Error::InvalidCursor {
        cursor: cursor.to_string(),
    };
    let bytes = STANDARD.decode(cursor).map_err(|_| invalid())?;
    let decoded = String::from_utf8(bytes).map_err(|_| invalid())?;
    decoded
        .strip_prefix(CURSOR_PREFIX)
        .and_then(|index| index.parse().ok())
        .ok_or_else(invalid)
}

/// One page of a result set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    rows: Vec<Row>,
    offset: usize,
    total_count: usize,
}

impl Page {
    pub fn new(rows: Vec<Row>, offset: usize, total_count: usize) -> Self {
        Self {
            rows,
            offset,
            total_count,
        }
    }

    /// A page of an empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Position of the first record of this page in the full result set.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn info(&self) -> PageInfo {
        PageInfo {
            has_next_page: self.offset + self.rows.len() < self.total_count,
            has_previous_page: self.offset > 0,
            total_count: self.total_count,
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.rows.iter().enumerate().map(|(i, row)| Edge {
            node: row.clone(),
            cursor: encode_cursor(self.offset + i),
        })
    }
}

/// A record in a page, with its cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub node: Row,
    pub cursor: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub total_count: usize,
}

fn page_info_field(name: &str, ty: &str, get: fn(&PageInfo) -> Value) -> FieldDefinition {
    FieldDefinition::new(name, TypeRef::named_nn(ty), move |ctx| {
        FieldFuture::new(async move {
            let info = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
            Ok(Some(FieldValue::value(get(info))))
        })
    })
}

/// The `PageInfo` object type shared by all connections.
pub fn page_info_type() -> ObjectDefinition {
    ObjectDefinition::new(
        PAGE_INFO,
        vec![
            page_info_field("hasNextPage", TypeRef::BOOLEAN, |info| {
                Value::Boolean(info.has_next_page)
            }),
            page_info_field("hasPreviousPage", TypeRef::BOOLEAN, |info| {
                Value::Boolean(info.has_previous_page)
            }),
            page_info_field("totalCount", TypeRef::INT, |info| {
                Value::Number(Number::from(info.total_count))
            }),
        ],
    )
    .description("Information about a page of a connection.")
}

/// Arguments accepted by every paginated query.
pub fn arguments() -> Vec<ArgumentDefinition> {
    vec![
        ArgumentDefinition::new("limit", TypeRef::named(TypeRef::INT))
            .description("Maximum number of records to return."),
        ArgumentDefinition::new("offset", TypeRef::named(TypeRef::INT))
            .description("Number of records to skip."),
        ArgumentDefinition::new("after", TypeRef::named(TypeRef::STRING))
            .description("Return records after the one with this cursor."),
    ]
}

/// The connection and edge types of one paginated query.
#[derive(Clone, Debug)]
pub struct ConnectionDefinition {
    node_type: String,
    connection: ObjectDefinition,
    edge: ObjectDefinition,
    limit: usize,
    maximum_limit: usize,
}

impl ConnectionDefinition {
    /// Connection types for the query `operation` returning records of type `node_type`.
    ///
    /// The types are named `<operation>Connection` and `<operation>Edge`. Their fields are
    /// produced lazily, so they may refer to types which are registered later.
    pub fn new(
        operation: &str,
        node_type: &str,
        tagger: Option<TypeTagger>,
        limit: usize,
        maximum_limit: usize,
    ) -> Self {
        let edge_name = format!("{operation}Edge");

        let edges_type = edge_name.clone();
        let connection = ObjectDefinition::new(
            format!("{operation}Connection"),
            Fields::lazy(move || {
                vec![
                    FieldDefinition::new("pageInfo", TypeRef::named_nn(PAGE_INFO), |ctx| {
                        FieldFuture::new(async move {
                            let page = ctx.parent_value.try_downcast_ref::<Page>()?;
                            Ok(Some(FieldValue::owned_any(page.info())))
                        })
                    }),
                    FieldDefinition::new(
                        "edges",
                        TypeRef::named_nn_list_nn(edges_type.as_str()),
                        |ctx| {
                            FieldFuture::new(async move {
                                let page = ctx.parent_value.try_downcast_ref::<Page>()?;
                                Ok(Some(FieldValue::list(
                                    page.edges().map(FieldValue::owned_any),
                                )))
                            })
                        },
                    ),
                ]
            }),
        );

        let node = node_type.to_string();
        let edge = ObjectDefinition::new(
            edge_name,
            Fields::lazy(move || {
                let tagger = tagger.clone();
                vec![
                    FieldDefinition::new("node", TypeRef::named_nn(node.as_str()), move |ctx| {
                        let tagger = tagger.clone();
                        FieldFuture::new(async move {
                            let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
                            let node = edge.node.clone();
                            Ok(Some(match &tagger {
                                Some(tagger) => tagger.tag(node),
                                None => FieldValue::owned_any(node),
                            }))
                        })
                    }),
                    FieldDefinition::new("cursor", TypeRef::named_nn(TypeRef::STRING), |ctx| {
                        FieldFuture::new(async move {
                            let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
                            Ok(Some(FieldValue::value(edge.cursor.clone())))
                        })
                    }),
                ]
            }),
        );

        Self {
            node_type: node_type.to_string(),
            connection,
            edge,
            limit,
            maximum_limit,
        }
    }

    /// Name of the connection type.
    pub fn name(&self) -> &str {
        self.connection.name()
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Fields of the connection type.
    pub fn fields(&self) -> &Fields {
        self.connection.fields()
    }

    pub fn edge(&self) -> &ObjectDefinition {
        &self.edge
    }

    /// Number of records returned when the query does not specify a limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn maximum_limit(&self) -> usize {
        self.maximum_limit
    }

    /// The types to register for this connection.
    pub fn types(&self) -> Vec<TypeDefinition> {
        vec![self.connection.clone().into(), self.edge.clone().into()]
    }

    /// Select the page requested by `args` from the full result set `rows`.
    pub fn paginate(&self, rows: Vec<Row>, args: &Arguments) -> Result<Page, Error> {
        paginate(rows, args, self.limit, self.maximum_limit)
    }
}

fn int_arg(args: &Arguments, name: &str) -> Option<usize> {
    match args.get(name) {
        // Negative values are treated as 0.
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|n| usize::try_from(n.max(0)).unwrap_or(usize::MAX))
            .or_else(|| n.as_u64().map(|n| usize::try_from(n).unwrap_or(usize::MAX))),
        _ => None,
    }
}

/// Select a page from `rows`.
///
/// The page size is the requested `limit` (or `default_limit`), capped at `maximum_limit`. The
/// page starts after the `after` cursor if one is given, and at `offset` otherwise.
pub(crate) fn paginate(
    rows: Vec<Row>,
    args: &Arguments,
    default_limit: usize,
    maximum_limit: usize,
) -> Result<Page, Error> {
    let limit = int_arg(args, "limit")
        .unwrap_or(default_limit)
        .min(maximum_limit);
    let offset = match args.get("after") {
        Some(Value::String(cursor)) => decode_cursor(cursor)?.saturating_add(1),
        _ => int_arg(args, "offset").unwrap_or(0),
    };
    let total_count = rows.len();
    let rows = rows.into_iter().skip(offset).take(limit).collect();
    Ok(Page::new(rows, offset, total_count))
}

#[cfg(test)]
mod test {
    use super::*;

    fn rows(n: i64) -> Vec<Row> {
        (1..=n).map(|id| Row::new("Post").with("id", id)).collect()
    }

    fn args(pairs: &[(&str, Value)]) -> Arguments {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn ids(page: &Page) -> Vec<i64> {
        page.rows().iter().filter_map(Row::id).collect()
    }

    #[test]
    fn test_cursor() {
        assert_eq!(encode_cursor(0), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(decode_cursor(&encode_cursor(42)).unwrap(), 42);
        for cursor in ["", "not base64!", "Zm9vOjE=" /* foo:1 */] {
            assert_eq!(
                decode_cursor(cursor).unwrap_err(),
                Error::InvalidCursor {
                    cursor: cursor.into()
                }
            );
        }
    }

    #[test]
    fn test_default_limit() {
        let page = paginate(rows(150), &args(&[]), 100, 100).unwrap();
        assert_eq!(page.rows().len(), 100);
        assert_eq!(page.total_count(), 150);
        assert_eq!(
            page.info(),
            PageInfo {
                has_next_page: true,
                has_previous_page: false,
                total_count: 150,
            }
        );
    }

    #[test]
    fn test_limit_capped_at_maximum() {
        let page = paginate(rows(50), &args(&[("limit", Value::from(40))]), 10, 25).unwrap();
        assert_eq!(page.rows().len(), 25);

        let page = paginate(rows(50), &args(&[("limit", Value::from(5))]), 10, 25).unwrap();
        assert_eq!(page.rows().len(), 5);
    }

    #[test]
    fn test_offset() {
        let page = paginate(
            rows(10),
            &args(&[("limit", Value::from(3)), ("offset", Value::from(8))]),
            100,
            100,
        )
        .unwrap();
        assert_eq!(ids(&page), [9, 10]);
        assert!(!page.info().has_next_page);
        assert!(page.info().has_previous_page);
        assert_eq!(
            page.edges().map(|edge| edge.cursor).collect::<Vec<_>>(),
            [encode_cursor(8), encode_cursor(9)]
        );
    }

    #[test]
    fn test_negative_arguments() {
        let page = paginate(
            rows(5),
            &args(&[("limit", Value::from(-1)), ("offset", Value::from(-3))]),
            100,
            100,
        )
        .unwrap();
        assert!(page.rows().is_empty());
        assert_eq!(page.offset(), 0);
        assert_eq!(page.total_count(), 5);
    }

    #[test]
    fn test_after_cursor() {
        let page = paginate(
            rows(5),
            &args(&[
                ("after", Value::from(encode_cursor(1))),
                ("offset", Value::from(0)),
                ("limit", Value::from(2)),
            ]),
            100,
            100,
        )
        .unwrap();
        assert_eq!(ids(&page), [3, 4]);

        let err = paginate(rows(5), &args(&[("after", Value::from("bogus"))]), 100, 100);
        assert!(matches!(err, Err(Error::InvalidCursor { .. })));
    }

    #[test]
    fn test_connection_types() {
        let conn = ConnectionDefinition::new("testQuery", "test", None, 100, 100);
        assert_eq!(conn.name(), "testQueryConnection");
        assert_eq!(conn.edge().name(), "testQueryEdge");
        assert!(!conn.fields().is_evaluated());

        let fields = conn
            .fields()
            .get()
            .iter()
            .map(|f| format!("{}: {}", f.name(), f.ty()))
            .collect::<Vec<_>>();
        assert_eq!(fields, ["pageInfo: PageInfo!", "edges: [testQueryEdge!]!"]);
        assert!(conn.edge().fields().contains("node"));
        assert!(conn.edge().fields().contains("cursor"));
    }
}
