//! Access control for query results.

use crate::{backend::QueryContext, record::Row};
use async_graphql::Value;

/// Decides whether the current request may see a result set.
///
/// The check sees the records about to be returned, after sorting and pagination, and is all or
/// nothing: if it fails, the query returns an empty result of the same shape.
pub trait PermissionChecker: Send + Sync {
    fn check_permission(&self, ctx: &QueryContext, results: &[Row]) -> bool;
}

impl<F> PermissionChecker for F
where
    F: Fn(&QueryContext, &[Row]) -> bool + Send + Sync,
{
    fn check_permission(&self, ctx: &QueryContext, results: &[Row]) -> bool {
        self(ctx, results)
    }
}

/// Allows every request. This is the default.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn check_permission(&self, _ctx: &QueryContext, _results: &[Row]) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DenyAll;

impl PermissionChecker for DenyAll {
    fn check_permission(&self, _ctx: &QueryContext, _results: &[Row]) -> bool {
        false
    }
}

/// Allows authenticated requests only.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequireUser;

impl PermissionChecker for RequireUser {
    fn check_permission(&self, ctx: &QueryContext, _results: &[Row]) -> bool {
        ctx.current_user.is_some()
    }
}

/// Allows a request only if the current user owns every record in the result set.
///
/// A record is owned by the user named in its `field` property.
#[derive(Clone, Debug)]
pub struct OwnedBy {
    field: String,
}

impl OwnedBy {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl PermissionChecker for OwnedBy {
    fn check_permission(&self, ctx: &QueryContext, results: &[Row]) -> bool {
        let Some(user) = &ctx.current_user else {
            return false;
        };
        results.iter().all(|row| match row.get(&self.field) {
            Some(Value::String(owner)) => owner == user,
            _ => false,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn posts() -> Vec<Row> {
        vec![
            Row::new("Post").with("author", "ada"),
            Row::new("Post").with("author", "ada"),
        ]
    }

    #[test]
    fn test_builtin_checkers() {
        let anon = QueryContext::anonymous();
        let ada = QueryContext::user("ada");
        assert!(AllowAll.check_permission(&anon, &posts()));
        assert!(!DenyAll.check_permission(&ada, &posts()));
        assert!(!RequireUser.check_permission(&anon, &[]));
        assert!(RequireUser.check_permission(&ada, &[]));
    }

    #[test]
    fn test_owned_by() {
        let checker = OwnedBy::new("author");
        let mut rows = posts();
        assert!(checker.check_permission(&QueryContext::user("ada"), &rows));
        assert!(!checker.check_permission(&QueryContext::user("bob"), &rows));
        assert!(!checker.check_permission(&QueryContext::anonymous(), &rows));

        rows.push(Row::new("Post").with("author", "bob"));
        assert!(!checker.check_permission(&QueryContext::user("ada"), &rows));
    }

    #[test]
    fn test_closure_checker() {
        let at_most_one = |_: &QueryContext, rows: &[Row]| rows.len() <= 1;
        assert!(!at_most_one.check_permission(&QueryContext::anonymous(), &posts()));
        assert!(at_most_one.check_permission(&QueryContext::anonymous(), &posts()[..1]));
    }
}
