//! Post ↔ media relationship loading.
//!
//! # Responsibility
//! - Resolve the media set of one post, or of a batch of posts, through the
//!   `post_media` association table.
//!
//! # Invariants
//! - A batch costs one lookup regardless of size; an empty batch costs none.
//! - Posts without associations end up with `media = []`.
//! - Loading never writes to `post_media`.

use super::filter::Predicate;
use super::rows::StoredRecord;
use crate::error::RepoResult;
use crate::model::media::Media;
use crate::model::post::Post;
use crate::model::EntityId;
use log::debug;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashMap;

/// Source of `(post_id, media)` association pairs.
pub trait PostMediaSource {
    /// Returns the media linked to any of `post_ids` in a single lookup,
    /// ordered by post id then media id.
    fn media_links(&self, post_ids: &[EntityId]) -> RepoResult<Vec<(EntityId, Media)>>;
}

impl PostMediaSource for Connection {
    fn media_links(&self, post_ids: &[EntityId]) -> RepoResult<Vec<(EntityId, Media)>> {
        let predicate = Predicate::match_all().and_in("pm.post_id", post_ids);
        let sql = format!(
            "SELECT
                pm.post_id AS post_id,
                m.id AS id,
                m.url AS url,
                m.type AS type,
                m.created_at AS created_at,
                m.updated_at AS updated_at
             FROM post_media pm
             INNER JOIN media m ON m.id = pm.media_id{}
             ORDER BY pm.post_id ASC, m.id ASC;",
            predicate.where_sql()
        );

        let mut stmt = self.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(predicate.binds()))?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            let post_id: EntityId = row.get("post_id")?;
            links.push((post_id, Media::from_row(row)?));
        }
        Ok(links)
    }
}

/// Loads the media set of one post.
pub fn load_post_media<S>(source: &S, post_id: EntityId) -> RepoResult<Vec<Media>>
where
    S: PostMediaSource + ?Sized,
{
    let links = source.media_links(&[post_id])?;
    Ok(links.into_iter().map(|(_, media)| media).collect())
}

/// Fills `media` on every post with one lookup for the whole batch.
pub fn attach_media<S>(source: &S, posts: &mut [Post]) -> RepoResult<()>
where
    S: PostMediaSource + ?Sized,
{
    if posts.is_empty() {
        return Ok(());
    }

    let post_ids: Vec<EntityId> = posts.iter().map(|post| post.id).collect();
    let links = source.media_links(&post_ids)?;
    let link_count = links.len();

    let mut by_post: HashMap<EntityId, Vec<Media>> = HashMap::new();
    for (post_id, media) in links {
        by_post.entry(post_id).or_default().push(media);
    }
    for post in posts.iter_mut() {
        post.media = by_post.remove(&post.id).unwrap_or_default();
    }

    debug!(
        "event=relation_load module=repo status=ok posts={} links={}",
        post_ids.len(),
        link_count
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{attach_media, load_post_media, PostMediaSource};
    use crate::error::RepoResult;
    use crate::model::media::Media;
    use crate::model::post::Post;
    use crate::model::EntityId;
    use std::cell::{Cell, RefCell};

    /// In-memory association table that records every lookup.
    struct CountingSource {
        links: Vec<(EntityId, Media)>,
        calls: Cell<usize>,
        last_ids: RefCell<Vec<EntityId>>,
    }

    impl CountingSource {
        fn new(links: Vec<(EntityId, Media)>) -> Self {
            Self {
                links,
                calls: Cell::new(0),
                last_ids: RefCell::new(Vec::new()),
            }
        }
    }

    impl PostMediaSource for CountingSource {
        fn media_links(&self, post_ids: &[EntityId]) -> RepoResult<Vec<(EntityId, Media)>> {
            self.calls.set(self.calls.get() + 1);
            *self.last_ids.borrow_mut() = post_ids.to_vec();
            Ok(self
                .links
                .iter()
                .filter(|(post_id, _)| post_ids.contains(post_id))
                .cloned()
                .collect())
        }
    }

    fn media(id: EntityId) -> Media {
        Media {
            id,
            url: format!("https://cdn.example/{id}.png"),
            kind: "image".to_string(),
            created_at: 1,
            updated_at: 1,
        }
    }

    fn post(id: EntityId) -> Post {
        Post {
            id,
            title: format!("post {id}"),
            content: "body".to_string(),
            author: None,
            created_at: 1,
            updated_at: 1,
            media: Vec::new(),
        }
    }

    #[test]
    fn batch_load_uses_one_lookup_and_distributes() {
        let source = CountingSource::new(vec![(1, media(10)), (1, media(11)), (3, media(10))]);
        let mut posts: Vec<Post> = (1..=4).map(post).collect();

        attach_media(&source, &mut posts).unwrap();

        assert_eq!(source.calls.get(), 1);
        assert_eq!(*source.last_ids.borrow(), vec![1, 2, 3, 4]);
        assert_eq!(posts[0].media_ids(), vec![10, 11]);
        assert!(posts[1].media.is_empty());
        assert_eq!(posts[2].media_ids(), vec![10]);
        assert!(posts[3].media.is_empty());
    }

    #[test]
    fn empty_batch_issues_no_lookup() {
        let source = CountingSource::new(vec![(1, media(10))]);
        let mut posts: Vec<Post> = Vec::new();

        attach_media(&source, &mut posts).unwrap();

        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn single_load_is_keyed_by_post_id() {
        let source = CountingSource::new(vec![(1, media(10)), (2, media(12))]);

        let loaded = load_post_media(&source, 2).unwrap();

        assert_eq!(source.calls.get(), 1);
        assert_eq!(*source.last_ids.borrow(), vec![2]);
        assert_eq!(loaded, vec![media(12)]);
    }

    #[test]
    fn stale_media_on_input_is_replaced() {
        let source = CountingSource::new(Vec::new());
        let mut posts = vec![post(5)];
        posts[0].media.push(media(99));

        attach_media(&source, &mut posts).unwrap();

        assert!(posts[0].media.is_empty());
    }
}
