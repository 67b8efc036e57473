//! Errors reported while building or resolving a scaffolded schema.

use snafu::Snafu;

/// Errors reported by the scaffolding layer.
///
/// Configuration and type errors are raised while the schema is being built and are fatal to
/// [`Manager::finish`](crate::schema::Manager::finish). Fetch and cursor errors are raised while
/// resolving a request and end up in the GraphQL response's error list for the offending field.
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// An operation was configured with invalid settings.
    #[snafu(display("invalid configuration for {}: {}", operation, message))]
    Configuration { operation: String, message: String },

    /// An operation refers to a type which was never registered.
    #[snafu(display("type {} is not registered", name))]
    UnknownType { name: String },

    /// A runtime value has no registered schema type.
    #[snafu(display("cannot resolve a schema type for record class {}", class))]
    UnresolvedType { class: String },

    /// A pagination cursor could not be decoded.
    #[snafu(display("invalid cursor {:?}", cursor))]
    InvalidCursor { cursor: String },

    /// The data-fetch delegate failed.
    #[snafu(display("failed to fetch {}: {}", operation, message))]
    Fetch { operation: String, message: String },

    /// The GraphQL engine rejected the assembled schema.
    #[snafu(display("invalid schema: {}", message))]
    Schema { message: String },
}

impl Error {
    /// A configuration error for `operation`.
    pub fn config(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// A fetch error for `operation`.
    pub fn fetch(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Fetch {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}
