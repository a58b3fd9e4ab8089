use cms_core::db::open_db_in_memory;
use cms_core::{
    EntityId, ErrorKind, MediaRef, MediaRepository, NewMedia, NewPost, PostFilter, PostPatch,
    PostRepository, RepoError, SqliteMediaRepository, SqlitePostRepository, ValidationError,
};
use rusqlite::Connection;
use std::cell::Cell;

thread_local! {
    static ASSOCIATION_LOOKUPS: Cell<usize> = const { Cell::new(0) };
}

fn count_association_lookups(sql: &str) {
    if sql.contains("FROM post_media") {
        ASSOCIATION_LOOKUPS.with(|count| count.set(count.get() + 1));
    }
}

fn association_lookups() -> usize {
    ASSOCIATION_LOOKUPS.with(Cell::get)
}

fn seed_media(conn: &Connection, count: usize) -> Vec<EntityId> {
    let repo = SqliteMediaRepository::try_new(conn).unwrap();
    (0..count)
        .map(|index| {
            repo.create_media(&NewMedia::new(
                format!("https://cdn.example/{index}.png"),
                "image",
            ))
            .unwrap()
            .id
        })
        .collect()
}

fn post_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM posts;", [], |row| row.get(0))
        .unwrap()
}

fn association_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM post_media;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_with_media_returns_full_record() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 2);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let post = repo
        .create_post(
            &NewPost::new("Launch", "We shipped")
                .with_author("Ada")
                .with_media(media_ids.clone()),
        )
        .unwrap();

    assert_eq!(post.id, 1);
    assert_eq!(post.author.as_deref(), Some("Ada"));
    assert_eq!(post.created_at, post.updated_at);
    assert_eq!(post.media_ids(), media_ids);
    assert_eq!(post.media[0].url, "https://cdn.example/0.png");
    assert_eq!(repo.get_post(post.id).unwrap(), post);
}

#[test]
fn duplicate_media_references_are_linked_once() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 1);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let post = repo
        .create_post(&NewPost::new("Twice", "Same image").with_media([media_ids[0], media_ids[0]]))
        .unwrap();

    assert_eq!(post.media.len(), 1);
    assert_eq!(association_count(&conn), 1);
}

#[test]
fn create_with_unknown_media_is_validation_error_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 1);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let err = repo
        .create_post(&NewPost::new("Broken", "Refs").with_media([media_ids[0], 404]))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownMedia(404))
    ));
    assert_eq!(post_count(&conn), 0);
    assert_eq!(association_count(&conn), 0);
}

#[test]
fn create_rejects_invalid_author() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let err = repo
        .create_post(&NewPost::new("Title", "Body").with_author("a".repeat(101)))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::FieldTooLong {
            field: "author",
            max_chars: 100,
            ..
        })
    ));

    let anonymous = repo
        .create_post(&NewPost::new("Title", "Body").with_author(""))
        .unwrap();
    assert_eq!(anonymous.author, None);
}

#[test]
fn post_without_media_serializes_empty_media_list() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let post = repo.create_post(&NewPost::new("Plain", "Text")).unwrap();

    let fetched = repo.get_post(post.id).unwrap();
    let json = serde_json::to_value(&fetched).unwrap();

    assert!(fetched.media.is_empty());
    assert_eq!(json["media"], serde_json::json!([]));
    assert_eq!(json["author"], serde_json::Value::Null);
}

#[test]
fn update_title_only_keeps_content_author_and_media() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 1);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let created = repo
        .create_post(
            &NewPost::new("Old", "Body")
                .with_author("Grace")
                .with_media(media_ids.clone()),
        )
        .unwrap();

    let patch = PostPatch {
        title: Some("New".to_string()),
        ..PostPatch::default()
    };
    let updated = repo.update_post(created.id, &patch).unwrap();

    assert_eq!(updated.title, "New");
    assert_eq!(updated.content, "Body");
    assert_eq!(updated.author.as_deref(), Some("Grace"));
    assert_eq!(updated.media_ids(), media_ids);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(repo.get_post(created.id).unwrap(), updated);
}

#[test]
fn update_with_media_replaces_and_empty_list_keeps_set() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 3);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let created = repo
        .create_post(&NewPost::new("Album", "Photos").with_media([media_ids[0], media_ids[1]]))
        .unwrap();

    let replace = PostPatch {
        media: Some(vec![MediaRef::from(media_ids[2])]),
        ..PostPatch::default()
    };
    let replaced = repo.update_post(created.id, &replace).unwrap();
    assert_eq!(replaced.media_ids(), vec![media_ids[2]]);

    let keep = PostPatch {
        media: Some(Vec::new()),
        ..PostPatch::default()
    };
    let kept = repo.update_post(created.id, &keep).unwrap();
    assert_eq!(kept.media_ids(), vec![media_ids[2]]);
    assert_eq!(association_count(&conn), 1);
}

#[test]
fn update_with_unknown_media_keeps_previous_state() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 1);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let created = repo
        .create_post(&NewPost::new("Stable", "Body").with_media(media_ids.clone()))
        .unwrap();

    let patch = PostPatch {
        title: Some("Changed".to_string()),
        media: Some(vec![MediaRef::from(999)]),
        ..PostPatch::default()
    };
    let err = repo.update_post(created.id, &patch).unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownMedia(999))
    ));
    assert_eq!(repo.get_post(created.id).unwrap(), created);
}

#[test]
fn update_missing_post_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let err = repo.update_post(12, &PostPatch::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Post not found");
}

#[test]
fn list_filters_author_exactly_and_title_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    repo.create_post(&NewPost::new("Rust tips", "a").with_author("alice"))
        .unwrap();
    repo.create_post(&NewPost::new("More RUST", "b").with_author("Alice"))
        .unwrap();
    repo.create_post(&NewPost::new("Cooking", "c").with_author("bob"))
        .unwrap();

    let by_alice = repo.list_posts(&PostFilter::by_author("alice")).unwrap();
    assert_eq!(
        by_alice.iter().map(|post| post.id).collect::<Vec<_>>(),
        vec![1]
    );

    let rusty = repo.list_posts(&PostFilter::title_contains("rust")).unwrap();
    assert_eq!(
        rusty.iter().map(|post| post.id).collect::<Vec<_>>(),
        vec![1, 2]
    );

    let combined = PostFilter {
        title: Some("rust".to_string()),
        author: Some("Alice".to_string()),
    };
    let both = repo.list_posts(&combined).unwrap();
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].title, "More RUST");
}

#[test]
fn list_posts_loads_all_media_in_one_lookup() {
    let mut conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 3);
    {
        let repo = SqlitePostRepository::try_new(&conn).unwrap();
        for index in 0..5 {
            let payload = NewPost::new(format!("Post {index}"), "Body");
            let payload = if index % 2 == 0 {
                payload.with_media([media_ids[index % 3]])
            } else {
                payload
            };
            repo.create_post(&payload).unwrap();
        }
    }

    conn.trace(Some(count_association_lookups));
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let before = association_lookups();
    let posts = repo.list_posts(&PostFilter::default()).unwrap();
    let lookups = association_lookups() - before;

    assert_eq!(lookups, 1);
    assert_eq!(posts.len(), 5);
    assert_eq!(posts[0].media_ids(), vec![media_ids[0]]);
    assert!(posts[1].media.is_empty());
    assert_eq!(posts[2].media_ids(), vec![media_ids[2]]);
    assert_eq!(posts[4].media_ids(), vec![media_ids[1]]);
}

#[test]
fn list_posts_handles_more_posts_than_sqlite_host_parameters() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 1);
    conn.execute_batch(
        "WITH RECURSIVE seq(n) AS (
             SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 40000
         )
         INSERT INTO posts (title, content, created_at, updated_at)
         SELECT 'Bulk ' || n, 'Body', 1, 1 FROM seq;",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO post_media (post_id, media_id) VALUES (40000, ?1);",
        [media_ids[0]],
    )
    .unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let posts = repo.list_posts(&PostFilter::default()).unwrap();

    assert_eq!(posts.len(), 40_000);
    assert!(posts[0].media.is_empty());
    assert_eq!(posts[39_999].media_ids(), media_ids);
}

#[test]
fn create_with_large_unknown_media_list_is_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 2);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let mut references = media_ids.clone();
    references.extend(1_000..41_000);

    let err = repo
        .create_post(&NewPost::new("Huge", "Refs").with_media(references))
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownMedia(1_000))
    ));
    assert_eq!(post_count(&conn), 0);
}

#[test]
fn empty_post_list_skips_association_lookup() {
    let mut conn = open_db_in_memory().unwrap();
    conn.trace(Some(count_association_lookups));
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let before = association_lookups();
    let posts = repo.list_posts(&PostFilter::by_author("nobody")).unwrap();

    assert!(posts.is_empty());
    assert_eq!(association_lookups() - before, 0);
}

#[test]
fn association_failure_rolls_back_post_insert() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 1);
    conn.execute_batch(
        "CREATE TRIGGER reject_links BEFORE INSERT ON post_media
         BEGIN
             SELECT RAISE(ABORT, 'association rejected');
         END;",
    )
    .unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let err = repo
        .create_post(&NewPost::new("Half", "Written").with_media(media_ids))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(post_count(&conn), 0);
    assert!(conn.is_autocommit());
}

#[test]
fn failed_replacement_keeps_previous_associations() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 2);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let created = repo
        .create_post(&NewPost::new("Linked", "Body").with_media([media_ids[0]]))
        .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_links BEFORE INSERT ON post_media
         BEGIN
             SELECT RAISE(ABORT, 'association rejected');
         END;",
    )
    .unwrap();

    let patch = PostPatch {
        title: Some("Relinked".to_string()),
        media: Some(vec![MediaRef::from(media_ids[1])]),
        ..PostPatch::default()
    };
    let err = repo.update_post(created.id, &patch).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(repo.get_post(created.id).unwrap(), created);
}

#[test]
fn deleting_post_removes_associations_but_keeps_media() {
    let conn = open_db_in_memory().unwrap();
    let media_ids = seed_media(&conn, 2);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let post = repo
        .create_post(&NewPost::new("Gone", "Soon").with_media(media_ids.clone()))
        .unwrap();

    let deleted = repo.delete_post(post.id).unwrap();

    assert_eq!(deleted.message(), "Post deleted successfully");
    assert_eq!(association_count(&conn), 0);
    assert_eq!(repo.get_post(post.id).unwrap_err().kind(), ErrorKind::NotFound);
    let media_repo = SqliteMediaRepository::try_new(&conn).unwrap();
    assert_eq!(media_repo.get_media(media_ids[1]).unwrap().id, media_ids[1]);
}
