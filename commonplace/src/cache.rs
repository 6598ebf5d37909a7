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

//! # the cache-aside layer
//!
//! ## Introduction
//!
//! Recommendation & search results are derived, expensive, and requested far more often than the
//! underlying posts change-- the classic cache-aside shape. [fetch] wraps any read path in
//! get-or-compute-and-store against a key-value [Store]; the write side invalidates explicitly
//! through [invalidate] whenever a post is created, updated, moved or deleted.
//!
//! Two invariants, both load-bearing:
//!
//! 1. a cache entry's value is always re-derivable from current storage-- the cache is pure
//!    acceleration, never source of truth. Entries are *deleted* on invalidation, never updated in
//!    place; the next read recomputes & repopulates.
//! 2. a cache failure must never take down a read: store errors degrade to "always recompute" (and
//!    a `warn!`), nothing more. Likewise a failed invalidation never rolls back the mutation that
//!    triggered it-- staleness beats blocked writes, and the TTL bounds the damage.
//!
//! ## Key naming
//!
//! Keys are deterministic strings derived from the query shape-- `"feed:tutorials"`,
//! `"tutorials:search:react hooks"`, &c ([keys]). A single edit can change the result of
//! arbitrarily many prior search queries, so invalidation sweeps whole prefixes (everything under
//! `"feed:tutorials:search:"`) rather than trying to be clever about which queries were affected.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snafu::{prelude::*, Backtrace, IntoError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::entities::PostType;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Cache store failure: {source}"))]
    Store {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        backtrace: Backtrace,
    },
}

impl Error {
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        StoreSnafu.into_error(Box::new(err) as Box<dyn std::error::Error + Send + Sync>)
    }
}

type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          Store trait                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A key-value cache store; externally owned, concurrently shared by many requests.
///
/// Values are serialized JSON strings; this layer neither inspects nor re-validates them. A `ttl`
/// of `None` means "use the store's default"-- entries always age out eventually even without
/// explicit invalidation.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// All keys beginning with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          cache-aside                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Get-or-compute-and-store.
///
/// On a hit the stored value is returned verbatim. On a miss (or a store *read* failure, which
/// merely gets a `warn!`), `compute` runs and its value is returned immediately; the store write
/// happens on a detached task so it can never delay-- or fail-- the response. The write is an
/// idempotent overwrite of a derived value, so the delete/repopulate race with [invalidate] is
/// self-healing: worst case a stale entry survives until the next miss or its TTL.
pub async fn fetch<F, Fut, E>(
    store: Arc<dyn Store>,
    key: &str,
    ttl: Option<Duration>,
    compute: F,
) -> std::result::Result<String, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<String, E>>,
{
    match store.get(key).await {
        Ok(Some(value)) => {
            debug!("cache hit on {key}");
            return Ok(value);
        }
        Ok(None) => debug!("cache miss on {key}"),
        Err(err) => warn!("cache read for {key} failed ({err}); recomputing"),
    }

    let value = compute().await?;

    let write_key = key.to_owned();
    let write_value = value.clone();
    tokio::spawn(async move {
        if let Err(err) = store.put(&write_key, &write_value, ttl).await {
            warn!("deferred cache write for {write_key} failed: {err}");
        }
    });

    Ok(value)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           key naming                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Cache-key derivation.
///
/// These strings are shared contract between the read paths that populate them & the invalidation
/// sweep that deletes them; change them in lockstep or not at all.
pub mod keys {
    use super::PostType;

    /// The unified home feed restricted to one post type: `"feed:tutorials"`.
    pub fn feed_list(post_type: PostType) -> String {
        format!("feed:{}", post_type.collection())
    }
    /// A searched home feed: `"feed:tutorials:search:react hooks"`. `query` should already be
    /// normalized (trimmed, lowercased) so that equivalent queries share an entry.
    pub fn feed_search(post_type: PostType, query: &str) -> String {
        format!("feed:{}:search:{}", post_type.collection(), query)
    }
    /// A type's index page listing: `"tutorials:list"`.
    pub fn list(post_type: PostType) -> String {
        format!("{}:list", post_type.collection())
    }
    /// A type's searched listing: `"tutorials:search:react hooks"`.
    pub fn search(post_type: PostType, query: &str) -> String {
        format!("{}:search:{}", post_type.collection(), query)
    }
    /// The prefixes swept by invalidation for this type.
    pub fn search_prefixes(post_type: PostType) -> [String; 2] {
        [
            format!("feed:{}:search:", post_type.collection()),
            format!("{}:search:", post_type.collection()),
        ]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          invalidation                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Remove every cache entry whose derivation could have included a post of `post_type`: the list &
/// feed keys, plus everything under the search prefixes.
///
/// Infallible by design: failures are logged & swallowed. The mutation that triggered us has
/// already happened; refusing to complete it over a cache hiccup would invert the cache's role.
pub async fn invalidate(store: &dyn Store, post_type: PostType) {
    for key in [keys::feed_list(post_type), keys::list(post_type)] {
        if let Err(err) = store.delete(&key).await {
            warn!("failed to invalidate {key}: {err}");
        }
    }
    for prefix in keys::search_prefixes(post_type) {
        match store.list(&prefix).await {
            Ok(matched) => {
                for key in matched {
                    if let Err(err) = store.delete(&key).await {
                        warn!("failed to invalidate {key}: {err}");
                    }
                }
            }
            Err(err) => warn!("failed to enumerate keys under {prefix}: {err}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           MemoryStore                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// An in-memory [Store] with TTL expiry checked on read
///
/// Suits tests & single-process deployments; production points this trait at an external
/// key-value service instead.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<std::collections::HashMap<String, (String, Option<DateTime<Utc>>)>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

fn live(expiry: &Option<DateTime<Utc>>) -> bool {
    expiry.map(|at| at > Utc::now()).unwrap_or(true)
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|(_, expiry)| live(expiry))
            .map(|(value, _)| value.clone()))
    }
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expiry = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| Utc::now() + ttl);
        self.entries
            .write()
            .await
            .insert(key.to_owned(), (value.to_owned(), expiry));
        Ok(())
    }
    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|(key, (_, expiry))| key.starts_with(prefix) && live(expiry))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod check_keys {
    use super::*;

    #[test]
    fn bit_exact() {
        assert_eq!(keys::feed_list(PostType::Tutorial), "feed:tutorials");
        assert_eq!(
            keys::feed_search(PostType::Tutorial, "react hooks"),
            "feed:tutorials:search:react hooks"
        );
        assert_eq!(keys::list(PostType::Tutorial), "tutorials:list");
        assert_eq!(
            keys::search(PostType::Tutorial, "react hooks"),
            "tutorials:search:react hooks"
        );
        assert_eq!(keys::feed_list(PostType::Article), "feed:articles");
        assert_eq!(keys::list(PostType::Article), "articles:list");
    }
}

#[cfg(test)]
mod check_cache_aside {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    async fn settle() {
        // Let the detached write task run.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn computes_once_then_hits() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<String, std::convert::Infallible>("value".to_owned())
        };

        let got = fetch(store.clone(), "k", None, compute).await.unwrap();
        assert_eq!(got, "value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        settle().await;

        let got = fetch(store.clone(), "k", None, compute).await.unwrap();
        assert_eq!(got, "value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_forces_recompute() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let calls = AtomicUsize::new(0);
        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<String, std::convert::Infallible>("value".to_owned())
        };

        fetch(store.clone(), "k", None, compute).await.unwrap();
        settle().await;
        store.delete("k").await.unwrap();
        fetch(store.clone(), "k", None, compute).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn ttl_expires() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        store
            .put("k", "v", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalidation_sweeps_prefixes() {
        let store = MemoryStore::new();
        for key in [
            "feed:tutorials".to_owned(),
            "tutorials:list".to_owned(),
            keys::search(PostType::Tutorial, "react"),
            keys::search(PostType::Tutorial, "vue"),
            keys::feed_search(PostType::Tutorial, "react"),
            // An innocent bystander of another type:
            keys::list(PostType::Article),
        ] {
            store.put(&key, "cached", None).await.unwrap();
        }

        invalidate(&store, PostType::Tutorial).await;

        assert!(store.get("feed:tutorials").await.unwrap().is_none());
        assert!(store.get("tutorials:list").await.unwrap().is_none());
        assert!(store
            .get(&keys::search(PostType::Tutorial, "react"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get(&keys::search(PostType::Tutorial, "vue"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get(&keys::feed_search(PostType::Tutorial, "react"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get(&keys::list(PostType::Article))
            .await
            .unwrap()
            .is_some());
    }
}
