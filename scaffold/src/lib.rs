//! Derive a GraphQL schema from persistent record definitions.
//!
//! Records describe themselves with a [`RecordDescriptor`](record::RecordDescriptor) (usually via
//! `#[derive(Record)]`). The [`Manager`](schema::Manager) turns each record into an object type
//! implementing the shared `DataObject` interface, and [query scaffolders](scaffold) turn
//! declarative configuration into executable operations with sorting, pagination and permission
//! checks. Once everything is registered, [`Manager::finish`](schema::Manager::finish) produces an
//! immutable [`async_graphql`] schema ready to serve requests.

pub mod backend;
pub mod error;
pub mod record;
pub mod scaffold;
pub mod schema;

pub use async_graphql;
pub use error::Error;
pub use scaffold_derive::Record;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber configured from `RUST_LOG`, logging to stderr.
///
/// Safe to call more than once; only the first call has any effect.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // A subscriber installed by the host application takes precedence.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
