//! An HTTP GraphQL server over a scaffolded schema.

pub mod config;
pub mod demo;

use async_graphql::dynamic::Schema;
use scaffold::backend::QueryContext;

/// Header naming the user on whose behalf a request is made.
///
/// Authentication is out of scope; a real deployment would derive the user from a session.
pub const USER_HEADER: &str = "x-user";

/// A tide app serving `schema` at `/graphql`.
pub fn app(schema: Schema) -> tide::Server<()> {
    let mut app = tide::new();
    app.at("/graphql").post(move |req: tide::Request<()>| {
        let schema = schema.clone();
        async move {
            let ctx = match req.header(USER_HEADER) {
                Some(user) => QueryContext::user(user.last().as_str()),
                None => QueryContext::anonymous(),
            };
            let gql = async_graphql_tide::receive_request(req).await?.data(ctx);
            tracing::debug!("executing {:?}", gql.operation_name);
            async_graphql_tide::respond(schema.execute(gql).await)
        }
    });
    app
}
