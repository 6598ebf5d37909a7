// Copyright (C) 2025-2026 the commonplace authors
//
// This file is part of commonplace.
//
// commonplace is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// commonplace is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with commonplace.  If
// not, see <http://www.gnu.org/licenses/>.

//! # the in-memory storage backend
//!
//! An EAV table in a `HashMap`: each post is its id, its type & its raw attribute rows, decoded
//! through [Post::from_rows] on every read just as a relational backend would decode on `SELECT`.
//! This is the reference implementation of [Backend] (including the ranked feed query, which it
//! scores with the shared rules in [crate::feed]) & the substrate for the integration tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    entities::{AttrRow, Post, PostId, PostType, Slug},
    feed::{self, RankedQuery},
    storage::{Backend, Error},
};

/// One entity in the EAV table: its discriminator & its attribute rows, in insertion order.
#[derive(Clone, Debug)]
struct Entity {
    post_type: PostType,
    rows: Vec<AttrRow>,
}

/// An in-memory [Backend]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entities: RwLock<HashMap<PostId, Entity>>,
}

impl MemoryBackend {
    pub fn new() -> MemoryBackend {
        MemoryBackend::default()
    }
    /// Insert (or replace) a post as raw EAV rows.
    pub async fn put_rows(&self, id: PostId, post_type: PostType, rows: Vec<AttrRow>) {
        self.entities
            .write()
            .await
            .insert(id, Entity { post_type, rows });
    }
    /// Insert (or replace) a typed [Post], encoding it back to EAV rows. Tags are written as
    /// repeated rows under the `tags` key.
    pub async fn put_post(&self, post: &Post) {
        let mut rows = vec![
            AttrRow::new("slug", &post.slug),
            AttrRow::new("title", &post.title),
            AttrRow::new("excerpt", &post.excerpt),
            AttrRow::new("content", &post.content),
            AttrRow::new("term", &post.term),
            AttrRow::new("definition", &post.definition),
            AttrRow::new("created-at", &post.created_at.to_rfc3339()),
            AttrRow::new("updated-at", &post.updated_at.to_rfc3339()),
        ];
        if let Some(author) = &post.author_id {
            rows.push(AttrRow::new("author", &author.to_string()));
        }
        for tag in &post.tags {
            rows.push(AttrRow::new("tags", tag));
        }
        self.put_rows(post.id, post.post_type, rows).await;
    }
    pub async fn remove(&self, id: &PostId) {
        self.entities.write().await.remove(id);
    }
    /// Decode every entity, optionally restricted by type.
    async fn decode_all(&self, post_type: Option<PostType>) -> Result<Vec<Post>, Error> {
        self.entities
            .read()
            .await
            .iter()
            .filter(|(_, entity)| post_type.is_none() || post_type == Some(entity.post_type))
            .map(|(id, entity)| {
                Post::from_rows(*id, entity.post_type, &entity.rows).map_err(Error::new)
            })
            .collect()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list(&self, post_type: Option<PostType>) -> Result<Vec<Post>, Error> {
        let mut posts = self.decode_all(post_type).await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }
    async fn find_by_slug(
        &self,
        post_type: PostType,
        slug: &Slug,
    ) -> Result<Option<Post>, Error> {
        Ok(self
            .decode_all(Some(post_type))
            .await?
            .into_iter()
            .find(|post| &post.slug == slug))
    }
    async fn get(&self, id: &PostId) -> Result<Option<Post>, Error> {
        let guard = self.entities.read().await;
        match guard.get(id) {
            Some(entity) => Post::from_rows(*id, entity.post_type, &entity.rows)
                .map(Some)
                .map_err(Error::new),
            None => Ok(None),
        }
    }
    async fn ranked_search(&self, query: &RankedQuery) -> Result<Vec<PostId>, Error> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let mut scored = self
            .decode_all(None)
            .await?
            .into_iter()
            .filter_map(|post| {
                let score = feed::score(&post, query);
                (score > 0).then_some((score, post.created_at, post.id))
            })
            .collect::<Vec<(i64, DateTime<Utc>, PostId)>>();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        Ok(scored.into_iter().map(|(_, _, id)| id).collect())
    }
}

#[cfg(test)]
mod check_backend {
    use chrono::TimeZone;

    use super::*;

    fn post(post_type: PostType, slug: &str, title: &str, content: &str, day: u32) -> Post {
        Post {
            id: PostId::new(),
            post_type,
            slug: Slug::new(slug).unwrap(),
            title: title.to_owned(),
            excerpt: String::new(),
            content: content.to_owned(),
            tags: Vec::new(),
            term: String::new(),
            definition: String::new(),
            author_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn round_trips_through_eav_rows() {
        let backend = MemoryBackend::new();
        let mut tutorial = post(PostType::Tutorial, "react-hooks", "React hooks", "body", 1);
        tutorial.tags = vec!["react@18.2.0".to_owned(), "typescript@5.0.0".to_owned()];
        backend.put_post(&tutorial).await;

        let got = backend.get(&tutorial.id).await.unwrap().unwrap();
        assert_eq!(got.title, "React hooks");
        assert_eq!(got.tags, tutorial.tags);
        assert_eq!(got.created_at, tutorial.created_at);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let backend = MemoryBackend::new();
        backend.put_post(&post(PostType::Article, "old", "Old", "", 1)).await;
        backend.put_post(&post(PostType::Article, "new", "New", "", 2)).await;

        let posts = backend.list(Some(PostType::Article)).await.unwrap();
        assert_eq!(&*posts[0].slug, "new");
        assert_eq!(&*posts[1].slug, "old");
    }

    #[tokio::test]
    async fn find_by_slug_misses_cleanly() {
        let backend = MemoryBackend::new();
        backend.put_post(&post(PostType::Article, "here", "Here", "", 1)).await;
        assert!(backend
            .find_by_slug(PostType::Article, &Slug::new("not-here").unwrap())
            .await
            .unwrap()
            .is_none());
        // Same slug, wrong type: still a miss.
        assert!(backend
            .find_by_slug(PostType::Tutorial, &Slug::new("here").unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn ranked_search_title_over_content() {
        let backend = MemoryBackend::new();
        let in_title = post(PostType::Article, "why-remix", "Why Remix", "body", 1);
        let in_content = post(PostType::Article, "news", "Framework news", "all about remix", 2);
        backend.put_post(&in_title).await;
        backend.put_post(&in_content).await;

        let ids = backend
            .ranked_search(&RankedQuery::parse("remix"))
            .await
            .unwrap();
        // The title hit outranks the (newer) content hit.
        assert_eq!(ids, vec![in_title.id, in_content.id]);
    }

    #[tokio::test]
    async fn ranked_search_ties_break_newest_first() {
        let backend = MemoryBackend::new();
        let older = post(PostType::Article, "older", "Remix tips", "", 1);
        let newer = post(PostType::Article, "newer", "Remix tricks", "", 2);
        backend.put_post(&older).await;
        backend.put_post(&newer).await;

        let ids = backend
            .ranked_search(&RankedQuery::parse("remix"))
            .await
            .unwrap();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn ranked_search_spans_post_types() {
        let backend = MemoryBackend::new();
        let mut entry = post(PostType::Glossary, "hydration", "", "", 1);
        entry.term = "Hydration".to_owned();
        entry.definition = "Attaching behavior to HTML".to_owned();
        let bookmark = post(PostType::Bookmark, "a-link", "Hydration deep dive", "", 2);
        backend.put_post(&entry).await;
        backend.put_post(&bookmark).await;

        let ids = backend
            .ranked_search(&RankedQuery::parse("hydration"))
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn empty_query_ranks_nothing() {
        let backend = MemoryBackend::new();
        backend.put_post(&post(PostType::Article, "a", "A", "", 1)).await;
        assert!(backend
            .ranked_search(&RankedQuery::parse(""))
            .await
            .unwrap()
            .is_empty());
    }
}
