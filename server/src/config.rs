//! Operation configuration files.
//!
//! A configuration file is a JSON object mapping query names to the settings accepted by
//! [`QueryScaffolder::apply_config`](scaffold::scaffold::QueryScaffolder::apply_config):
//!
//! ```json
//! {
//!     "readPosts": {
//!         "sortableFields": ["title", "rating"],
//!         "paginate": { "defaultLimit": 10, "maximumLimit": 50 }
//!     }
//! }
//! ```

use anyhow::{bail, Context};
use scaffold::scaffold::QueryScaffolder;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings for each configured operation, keyed by operation name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperationConfig(Map<String, Value>);

impl OperationConfig {
    pub fn from_json(value: Value) -> anyhow::Result<Self> {
        let Value::Object(map) = value else {
            bail!("operation configuration must be a JSON object");
        };
        Ok(Self(map))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("cannot open config {}", path.display()))?;
        let value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("cannot parse config {}", path.display()))?;
        Self::from_json(value)
    }

    /// Apply the settings for `query`, if there are any.
    pub fn apply(&self, query: &mut QueryScaffolder) -> anyhow::Result<()> {
        if let Some(settings) = self.0.get(query.name()) {
            tracing::info!("configuring {}", query.name());
            query.apply_config(settings)?;
        }
        Ok(())
    }

    /// Names of the configured operations.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use scaffold::backend::FnSource;
    use serde_json::json;

    #[test]
    fn test_apply() {
        let config = OperationConfig::from_json(json!({
            "readPosts": { "paginate": { "limit": 7 } },
            "readMembers": { "sortableFields": "surname" },
        }))
        .unwrap();
        let mut operations = config.operations().collect::<Vec<_>>();
        operations.sort();
        assert_eq!(operations, ["readMembers", "readPosts"]);

        let mut posts = QueryScaffolder::list("readPosts", "Post", FnSource(|_: &_| vec![]));
        config.apply(&mut posts).unwrap();
        assert_eq!(posts.pagination_limit(), 7);

        let mut members = QueryScaffolder::list("readMembers", "Member", FnSource(|_: &_| vec![]));
        let err = config.apply(&mut members).unwrap_err();
        assert!(err.to_string().contains("sortableFields must be an array"), "{err}");

        let mut other = QueryScaffolder::list("readOther", "Other", FnSource(|_: &_| vec![]));
        config.apply(&mut other).unwrap();
    }

    #[test]
    fn test_not_an_object() {
        assert!(OperationConfig::from_json(json!(["readPosts"])).is_err());
    }
}
