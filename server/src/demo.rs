//! A small site with members and their blog posts.

use crate::config::OperationConfig;
use async_graphql::dynamic::Schema;
use scaffold::{
    backend::MemoryStore,
    record::Record,
    scaffold::{MutationScaffolder, QueryScaffolder, RequireUser},
    schema::{Manager, DATA_OBJECT},
    Record,
};

/// A registered member of the site.
#[derive(Clone, Debug, Record)]
#[record(class = "Site.Security.Member")]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub surname: String,
    /// Only visible to signed-in members.
    pub email: Option<String>,
    pub created: String,
    pub last_edited: String,
}

/// A blog post.
#[derive(Clone, Debug, Record)]
#[record(class = "Site.Blog.Post")]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[record(db = "HTMLText")]
    pub content: String,
    /// The member who wrote the post.
    #[record(db = "ForeignKey")]
    pub author_id: i64,
    pub rating: Option<f64>,
    pub created: String,
    pub last_edited: String,
}

/// Fill `store` with a fixed set of members and posts.
pub async fn seed(store: &MemoryStore) {
    let members = [(1, "Ada", "Lovelace"), (2, "Charles", "Babbage")];
    for (id, first_name, surname) in members {
        let member = Member {
            id,
            first_name: first_name.into(),
            surname: surname.into(),
            email: Some(format!("{}@example.com", first_name.to_lowercase())),
            created: "2023-01-01 00:00:00".into(),
            last_edited: "2023-01-01 00:00:00".into(),
        };
        store.insert(member.into_row()).await;
    }

    let posts = [
        (3, "Notes on the engine", 1, Some(4.5)),
        (4, "The difference engine", 2, Some(3.0)),
        (5, "On bernoulli numbers", 1, None),
        (6, "Punched cards", 2, Some(5.0)),
    ];
    for (id, title, author_id, rating) in posts {
        let post = Post {
            id,
            title: title.into(),
            content: format!("<p>{title}</p>"),
            author_id,
            rating,
            created: format!("2023-02-0{id} 12:00:00"),
            last_edited: format!("2023-02-0{id} 12:00:00"),
        };
        store.insert(post.into_row()).await;
    }
}

/// Build the schema serving `store`, with operations configured by `config`.
pub fn build_schema(store: &MemoryStore, config: &OperationConfig) -> anyhow::Result<Schema> {
    let member = Member::descriptor();
    let post = Post::descriptor();

    let mut manager = Manager::new();

    let mut queries = vec![];
    let mut read_members =
        QueryScaffolder::list("readMembers", member.type_name(), store.table(member.class()));
    read_members
        .set_description("Members of the site, for signed-in members only.")
        .add_sortable_fields(["surname", "firstName"])
        .set_permission_checker(RequireUser);
    queries.push(read_members);

    let mut read_posts =
        QueryScaffolder::list("readPosts", post.type_name(), store.table(post.class()));
    read_posts
        .set_description("Blog posts.")
        .add_args([("authorId", "Int")])
        .add_sortable_fields(["title", "rating", "created"]);
    queries.push(read_posts);

    let mut read_one_post =
        QueryScaffolder::item("readOnePost", post.type_name(), store.table(post.class()));
    read_one_post.add_args([("id", "Int!")]);
    queries.push(read_one_post);

    let mut data_objects = QueryScaffolder::list("dataObjects", DATA_OBJECT, store.all());
    data_objects.set_description("Every record on the site.");
    queries.push(data_objects);

    let mut data_object = QueryScaffolder::item("dataObject", DATA_OBJECT, store.all());
    data_object.add_args([("id", "Int!")]);
    queries.push(data_object);

    for mut query in queries {
        config.apply(&mut query)?;
        query.add_to_manager(&mut manager);
    }

    let mut create_post =
        MutationScaffolder::new("createPost", post.type_name(), store.table(post.class()));
    create_post
        .set_description("Publish a post.")
        .add_args([
            ("title", "String!"),
            ("content", "String!"),
            ("authorId", "Int!"),
        ])
        .set_permission_checker(RequireUser);
    create_post.add_to_manager(&mut manager);

    // Operations are scaffolded lazily, so records may be registered after the queries using them.
    manager.add_record(&member);
    manager.add_record(&post);

    Ok(manager.finish()?)
}
