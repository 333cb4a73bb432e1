use std::collections::BTreeMap;

use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, SqlErr, Value};
use uuid::Uuid;

use inkwell_core::domain::Post;
use inkwell_core::error::RepoError;
use inkwell_core::ports::{BaseRepository, FollowRepository, PostFilter, PostRepository};

use crate::database::entity::{follow, post};
use crate::database::postgres_base::violation_err;
use crate::database::postgres_repo::{PostgresFollowRepository, PostgresPostRepository};

fn post_row(author_id: Uuid, text: &str) -> post::Model {
    post::Model {
        id: Uuid::now_v7(),
        author_id,
        group_id: None,
        text: text.to_owned(),
        image: None,
        created_at: chrono::Utc::now().into(),
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

#[tokio::test]
async fn test_find_post_by_id() {
    let row = post_row(Uuid::new_v4(), "Test Post");
    let post_id = row.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = post.unwrap();
    assert_eq!(post.text, "Test Post");
    assert_eq!(post.id, post_id);
}

#[tokio::test]
async fn test_save_upserts_on_primary_key() {
    let row = post_row(Uuid::new_v4(), "edited");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let saved: Post = repo.save(Post::from(row.clone())).await.unwrap();
    assert_eq!(saved.id, row.id);

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("ON CONFLICT"));
    assert!(log.contains("DO UPDATE"));
}

#[tokio::test]
async fn test_update_is_a_plain_update() {
    let row = post_row(Uuid::new_v4(), "edited");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let updated = repo.update(Post::from(row.clone())).await.unwrap();
    assert_eq!(updated.text, "edited");

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("UPDATE"));
    assert!(!log.contains("INSERT"));
}

#[tokio::test]
async fn test_update_of_deleted_post_is_not_found() {
    let row = post_row(Uuid::new_v4(), "edited");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = repo.update(Post::from(row)).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[test]
fn test_foreign_key_violation_is_a_missing_reference() {
    let dangling = violation_err(SqlErr::ForeignKeyConstraintViolation(
        "posts_author_id_fkey".into(),
    ));
    assert!(matches!(dangling, Some(RepoError::MissingReference { .. })));

    let taken = violation_err(SqlErr::UniqueConstraintViolation("users_username_key".into()));
    assert!(matches!(taken, Some(RepoError::Constraint(_))));
}

#[tokio::test]
async fn test_count_and_list_page() {
    let author = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(12)]])
        .append_query_results(vec![vec![post_row(author, "b"), post_row(author, "a")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let filter = PostFilter::Author(author);

    assert_eq!(repo.count(&filter).await.unwrap(), 12);

    let posts = repo.list(&filter, 10, 10).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].text, "b");

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("ORDER BY"));
    assert!(log.contains("LIMIT"));
    assert!(log.contains("OFFSET"));
}

#[tokio::test]
async fn test_empty_author_set_skips_the_query() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = PostgresPostRepository::new(db);
    let filter = PostFilter::Authors(Vec::new());

    assert_eq!(repo.count(&filter).await.unwrap(), 0);
    assert!(repo.list(&filter, 0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_or_create_returns_existing_edge() {
    let (user_id, author_id) = (Uuid::new_v4(), Uuid::new_v4());
    let existing = follow::Model {
        id: Uuid::new_v4(),
        user_id,
        author_id,
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![existing.clone()]])
        .into_connection();

    let repo = PostgresFollowRepository::new(db);
    let (follow, created) = repo.get_or_create(user_id, author_id).await.unwrap();

    assert!(!created);
    assert_eq!(follow.id, existing.id);
}

#[tokio::test]
async fn test_remove_reports_whether_edge_existed() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresFollowRepository::new(db);
    let (user_id, author_id) = (Uuid::new_v4(), Uuid::new_v4());

    assert!(repo.remove(user_id, author_id).await.unwrap());
    assert!(!repo.remove(user_id, author_id).await.unwrap());
}
