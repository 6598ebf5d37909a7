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

//! # commonplace
//!
//! The content layer of a personal publishing site: articles, tutorials, bookmarks & glossary
//! entries stored as generic posts with key/value attributes. This crate is the *content discovery
//! engine* behind that site: it parses the free-form "technology tags" attached to tutorials,
//! recommends related tutorials through version-aware tag matching, filters & searches by
//! combining structured tag predicates with fuzzy text matching, ranks the unified home feed by
//! field-weighted relevance, and caches the (expensive, derived) results with explicit
//! invalidation on writes.
//!
//! Routing, rendering, authentication & the admin surface all live elsewhere; they consume this
//! crate through [discovery] and trigger invalidation through
//! [`invalidate_after_write`](discovery::invalidate_after_write).

pub mod cache;
pub mod config;
pub mod discovery;
pub mod entities;
pub mod feed;
pub mod fuzzy;
pub mod memory;
pub mod recommend;
pub mod search;
pub mod storage;
pub mod tags;
pub mod util;
