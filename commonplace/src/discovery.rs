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

//! # discovery
//!
//! The read-side entry points the presentation layer actually calls: related tutorials, tutorial
//! search & the unified home feed, each wrapped in the [cache-aside layer](crate::cache). This is
//! deliberately thin-- all the interesting logic lives in [recommend](crate::recommend),
//! [search](crate::search) & [feed](crate::feed); this module just wires those to [storage] &
//! derives the cache keys.
//!
//! Failure semantics, per the site's error taxonomy: search & recommendation degrade to empty
//! result sets rather than error pages (malformed tags & versions are swallowed far below here);
//! only a lookup miss for a single requested entity ([Error::NotFound]) is user-visible. A list
//! query returning zero rows is *not* an error.
//!
//! [storage]: crate::storage

use std::{sync::Arc, time::Duration};

use rand::Rng;
use snafu::{prelude::*, Backtrace};

use crate::{
    cache::{self, fetch, keys, Store},
    entities::{Post, PostType, Slug, Tutorial},
    feed::RankedQuery,
    recommend::{recommend, Recommendation},
    search::{search, SearchHit},
    storage::Backend,
};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("No tutorial with slug {slug}"))]
    NotFound { slug: Slug, backtrace: Backtrace },
    #[snafu(display("Storage failure: {source}"))]
    Storage {
        source: crate::storage::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("While decoding a post into a tutorial, {source}"))]
    Entity {
        source: crate::entities::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("While serializing a cached result, {source}"))]
    Ser {
        source: serde_json::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("While deserializing a cached result, {source}"))]
    De {
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        related tutorials                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Up to `limit` tutorials related to the one named by `slug` through a compatible technology tag.
///
/// A miss on `slug` itself is [Error::NotFound]; a tutorial with no relatable peers is an empty
/// vector. Intentionally uncached: the result is randomized per request, and pinning one sample in
/// the cache would defeat the point.
pub async fn related_tutorials<R: Rng>(
    backend: &(dyn Backend + Send + Sync),
    slug: &Slug,
    limit: usize,
    rng: &mut R,
) -> Result<Vec<Recommendation>> {
    let subject: Tutorial = backend
        .find_by_slug(PostType::Tutorial, slug)
        .await
        .context(StorageSnafu)?
        .ok_or(NotFoundSnafu { slug: slug.clone() }.build())?
        .try_into()
        .context(EntitySnafu)?;

    let peers = list_tutorials(backend).await?;
    Ok(recommend(&subject, &peers, limit, rng))
}

async fn list_tutorials(backend: &(dyn Backend + Send + Sync)) -> Result<Vec<Tutorial>> {
    backend
        .list(Some(PostType::Tutorial))
        .await
        .context(StorageSnafu)?
        .into_iter()
        .map(|post| Tutorial::try_from(post).context(EntitySnafu))
        .collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         tutorial search                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The tutorial index page: the full listing, or a tech-filtered/fuzzy search of it, cache-aside.
///
/// The cache key is derived from the *normalized* query (`"tutorials:list"` or
/// `"tutorials:search:<query>"`), so equivalent queries share an entry; the cached value is the
/// serialized result.
pub async fn tutorial_search(
    backend: &(dyn Backend + Send + Sync),
    store: &Arc<dyn Store>,
    query: Option<&str>,
    ttl: Option<Duration>,
) -> Result<Vec<SearchHit>> {
    let normalized = query
        .map(|text| text.trim().to_lowercase())
        .filter(|text| !text.is_empty());
    let key = match &normalized {
        Some(text) => keys::search(PostType::Tutorial, text),
        None => keys::list(PostType::Tutorial),
    };

    let json = fetch(store.clone(), &key, ttl, || async move {
        let tutorials = list_tutorials(backend).await?;
        let hits = match &normalized {
            Some(text) => search(&tutorials, text),
            None => search(&tutorials, ""),
        };
        serde_json::to_string(&hits).context(SerSnafu)
    })
    .await?;

    serde_json::from_str(&json).context(DeSnafu)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          the home feed                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// One type's lane of the unified home feed, cache-aside.
///
/// Without a query: the type's posts, newest first (`"feed:tutorials"`). With one: the
/// [ranked feed query](crate::feed) runs across *all* post types in the store (a title hit on an
/// article should beat a content hit on a tutorial no matter which lane you're looking at), and
/// this lane keeps its type's posts in rank order (`"feed:tutorials:search:<query>"`).
pub async fn home_feed(
    backend: &(dyn Backend + Send + Sync),
    store: &Arc<dyn Store>,
    post_type: PostType,
    query: Option<&str>,
    ttl: Option<Duration>,
) -> Result<Vec<Post>> {
    let normalized = query
        .map(|text| text.trim().to_lowercase())
        .filter(|text| !text.is_empty());
    let key = match &normalized {
        Some(text) => keys::feed_search(post_type, text),
        None => keys::feed_list(post_type),
    };

    let json = fetch(store.clone(), &key, ttl, || async move {
        let posts = match &normalized {
            Some(text) => {
                let ids = backend
                    .ranked_search(&RankedQuery::parse(text))
                    .await
                    .context(StorageSnafu)?;
                let mut posts = Vec::with_capacity(ids.len());
                for id in &ids {
                    if let Some(post) = backend.get(id).await.context(StorageSnafu)? {
                        if post.post_type == post_type {
                            posts.push(post);
                        }
                    }
                }
                posts
            }
            None => backend
                .list(Some(post_type))
                .await
                .context(StorageSnafu)?,
        };
        serde_json::to_string(&posts).context(SerSnafu)
    })
    .await?;

    serde_json::from_str(&json).context(DeSnafu)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          invalidation                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The write side's one obligation: call this after creating, updating, moving or deleting any
/// post (or anything that feeds a derived result, e.g. likes). Never fails; see
/// [cache::invalidate].
pub async fn invalidate_after_write(store: &dyn Store, post_type: PostType) {
    cache::invalidate(store, post_type).await
}
