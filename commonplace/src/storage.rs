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

//! # storage
//!
//! Abstractions over the post repository. The discovery engine is read-only: it lists posts, looks
//! them up by slug or id, and pushes the [ranked feed query](crate::feed) down to the store. The
//! write side lives elsewhere; its only obligation to this crate is to call
//! [`invalidate_after_write`](crate::discovery::invalidate_after_write) when it mutates anything.

use async_trait::async_trait;

use crate::{
    entities::{Post, PostId, PostType, Slug},
    feed::RankedQuery,
};

/// An opaque storage error; backends wrap whatever their driver throws.
#[derive(Debug)]
pub struct Error {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error {
            source: Box::new(err),
        }
    }
}

#[async_trait]
pub trait Backend {
    /// Retrieve all posts, optionally restricted to one type, ordered by `created_at` descending.
    /// Zero rows is an empty vector, not an error.
    async fn list(&self, post_type: Option<PostType>) -> Result<Vec<Post>, Error>;
    /// Retrieve a single post by type & slug. `None` means no such post-- the *caller* decides
    /// whether that's an error.
    async fn find_by_slug(&self, post_type: PostType, slug: &Slug)
        -> Result<Option<Post>, Error>;
    /// Retrieve a single post by id.
    async fn get(&self, id: &PostId) -> Result<Option<Post>, Error>;
    /// Execute the home-feed query as a single scored query, returning post ids ordered by
    /// relevance descending, ties broken by `created_at` descending. The matching & scoring rules
    /// are pinned down in [crate::feed]; implementations must not substitute their own (in
    /// particular, not lexical string comparison).
    async fn ranked_search(&self, query: &RankedQuery) -> Result<Vec<PostId>, Error>;
}
