//! Sorting of list results.

use crate::{
    record::Row,
    schema::{ArgumentDefinition, EnumDefinition, InputDefinition},
};
use async_graphql::{dynamic::TypeRef, Value};
use std::cmp::Ordering;
use strum::{Display, EnumString};

/// Name of the enum of sort directions.
pub const SORT_DIRECTION: &str = "SortDirection";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
pub enum Direction {
    #[default]
    #[strum(serialize = "ASC")]
    Asc,
    #[strum(serialize = "DESC")]
    Desc,
}

/// The `SortDirection` enum shared by all sortable queries.
pub fn direction_type() -> EnumDefinition {
    EnumDefinition::new(
        SORT_DIRECTION,
        [Direction::Asc.to_string(), Direction::Desc.to_string()],
    )
}

/// The enum of sortable fields and the sort key input type for the query `operation`.
pub fn sort_types(operation: &str, fields: &[String]) -> (EnumDefinition, InputDefinition) {
    let field_enum = EnumDefinition::new(format!("{operation}SortField"), fields.iter().cloned());
    let input = InputDefinition::new(
        format!("{operation}SortInput"),
        vec![
            ArgumentDefinition::new("field", TypeRef::named_nn(field_enum.name())),
            ArgumentDefinition::new("direction", TypeRef::named(SORT_DIRECTION)),
        ],
    );
    (field_enum, input)
}

/// One key of a multi-key sort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

fn name_of(value: &Value) -> Option<&str> {
    match value {
        Value::Enum(name) => Some(name.as_str()),
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Interpret a `sortBy` argument, keeping only keys on `sortable` fields.
pub fn sort_keys(sort_by: &Value, sortable: &[String]) -> Vec<SortKey> {
    let inputs = match sort_by {
        Value::List(inputs) => inputs.as_slice(),
        input @ Value::Object(_) => std::slice::from_ref(input),
        _ => &[],
    };
    inputs
        .iter()
        .filter_map(|input| {
            let Value::Object(input) = input else {
                return None;
            };
            let field = input.get("field").and_then(name_of)?;
            if !sortable.iter().any(|f| f == field) {
                tracing::warn!("ignoring sort on non-sortable field {field}");
                return None;
            }
            let direction = input
                .get("direction")
                .and_then(name_of)
                .and_then(|dir| dir.parse().ok())
                .unwrap_or_default();
            Some(SortKey {
                field: field.to_string(),
                direction,
            })
        })
        .collect()
}

/// Order two field values. Missing values and nulls sort first.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Boolean(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_) | Value::Enum(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::Boolean(a)), Some(Value::Boolean(b))) => a.cmp(b),
        (
            Some(a @ (Value::String(_) | Value::Enum(_))),
            Some(b @ (Value::String(_) | Value::Enum(_))),
        ) => name_of(a).cmp(&name_of(b)),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Stable sort of `rows` by `keys`, most significant first.
pub fn sort_rows(rows: &mut [Row], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        keys.iter().fold(Ordering::Equal, |ord, key| {
            ord.then_with(|| {
                let ord = compare(a.get(&key.field), b.get(&key.field));
                match key.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
        })
    });
}
