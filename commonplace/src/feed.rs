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

//! # the ranked home-feed query
//!
//! ## Introduction
//!
//! The unified home feed searches across *every* post type-- articles, tutorials, bookmarks &
//! glossary entries-- and, unlike [tutorial search](crate::search), must not haul the whole corpus
//! into application memory: the query is pushed down to the storage backend as a single scored
//! query. This module owns the two halves of that contract:
//!
//! 1. [RankedQuery]: the parsed query shape handed to
//!    [`Backend::ranked_search`](crate::storage::Backend::ranked_search);
//! 2. the matching & scoring rules ([matches]/[score]) every backend must implement, kept here so
//!    the in-memory backend and any SQL-pushed implementation can't drift apart.
//!
//! ## Ranking
//!
//! A post matches when the whole query does: an exact quoted phrase, or else every
//! whitespace-separated term, appearing case-insensitively in the fields relevant to the post's
//! type (`title` for articles/tutorials/bookmarks, `term` + `definition` for glossary entries,
//! plus `content` for articles/tutorials). The score is the *best* field hit-- +3 title/term, +2
//! definition, +1 content-- so one authoritative title match outranks any number of glancing
//! mentions buried in body text. Ties order by `created_at`, newest first.

use serde::{Deserialize, Serialize};

use crate::entities::{Post, PostType};

/// Relevance of a hit in a `title` or `term` attribute.
pub const SCORE_TITLE: i64 = 3;
/// Relevance of a hit in a glossary `definition`.
pub const SCORE_DEFINITION: i64 = 2;
/// Relevance of a hit in body `content`.
pub const SCORE_CONTENT: i64 = 1;

/// A home-feed query, parsed
///
/// Wrapping the whole query in double quotes demands the exact phrase; anything else is a bag of
/// terms, all required.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RankedQuery {
    Phrase(String),
    Terms(Vec<String>),
}

impl RankedQuery {
    /// Parse a raw query string; lowercases & trims on the way in.
    pub fn parse(query: &str) -> RankedQuery {
        let query = query.trim().to_lowercase();
        match query
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .filter(|phrase| !phrase.is_empty())
        {
            Some(phrase) => RankedQuery::Phrase(phrase.to_owned()),
            None => RankedQuery::Terms(
                query
                    .split_whitespace()
                    .map(|term| term.to_owned())
                    .collect(),
            ),
        }
    }
    /// An empty query matches everything & ranks nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            RankedQuery::Phrase(phrase) => phrase.is_empty(),
            RankedQuery::Terms(terms) => terms.is_empty(),
        }
    }
}

/// The fields of `post` the feed query may search, with their relevance weights.
///
/// Typed fields only-- the EAV keys these decoded from never reach this far.
fn searchable_fields(post: &Post) -> Vec<(&str, i64)> {
    match post.post_type {
        PostType::Article | PostType::Tutorial => vec![
            (post.title.as_str(), SCORE_TITLE),
            (post.content.as_str(), SCORE_CONTENT),
        ],
        PostType::Bookmark => vec![(post.title.as_str(), SCORE_TITLE)],
        PostType::Glossary => vec![
            (post.term.as_str(), SCORE_TITLE),
            (post.definition.as_str(), SCORE_DEFINITION),
        ],
    }
}

/// Does `post` match `query`? Every term (or the phrase) must appear, case-insensitively, in some
/// searchable field.
pub fn matches(post: &Post, query: &RankedQuery) -> bool {
    let fields = searchable_fields(post)
        .into_iter()
        .map(|(text, _)| text.to_lowercase())
        .collect::<Vec<String>>();
    let present = |needle: &str| fields.iter().any(|field| field.contains(needle));
    match query {
        RankedQuery::Phrase(phrase) => present(phrase),
        RankedQuery::Terms(terms) => {
            !terms.is_empty() && terms.iter().all(|term| present(term))
        }
    }
}

/// `post`'s relevance for `query`: the maximum weight among fields containing any part of the
/// query. Zero when the post doesn't match at all.
pub fn score(post: &Post, query: &RankedQuery) -> i64 {
    if !matches(post, query) {
        return 0;
    }
    searchable_fields(post)
        .into_iter()
        .filter(|(text, _)| {
            let text = text.to_lowercase();
            match query {
                RankedQuery::Phrase(phrase) => text.contains(phrase),
                RankedQuery::Terms(terms) => terms.iter().any(|term| text.contains(term)),
            }
        })
        .map(|(_, weight)| weight)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod check_ranked_query {
    use super::*;

    #[test]
    fn parse_terms() {
        assert_eq!(
            RankedQuery::parse("  Remix  loaders "),
            RankedQuery::Terms(vec!["remix".to_owned(), "loaders".to_owned()])
        );
    }

    #[test]
    fn parse_phrase() {
        assert_eq!(
            RankedQuery::parse("\"Remix loaders\""),
            RankedQuery::Phrase("remix loaders".to_owned())
        );
    }

    #[test]
    fn empty() {
        assert!(RankedQuery::parse("").is_empty());
        assert!(RankedQuery::parse("  ").is_empty());
        assert!(!RankedQuery::parse("remix").is_empty());
    }
}

#[cfg(test)]
mod check_scoring {
    use chrono::DateTime;

    use super::*;
    use crate::entities::{PostId, Slug};

    fn post(post_type: PostType, title: &str, content: &str) -> Post {
        Post {
            id: PostId::new(),
            post_type,
            slug: Slug::new("a-post").unwrap(),
            title: title.to_owned(),
            excerpt: String::new(),
            content: content.to_owned(),
            tags: Vec::new(),
            term: String::new(),
            definition: String::new(),
            author_id: None,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn title_beats_content() {
        let query = RankedQuery::parse("remix");
        let in_title = post(PostType::Article, "Why Remix", "body text");
        let in_content = post(PostType::Article, "Framework news", "all about remix");
        assert!(score(&in_title, &query) > score(&in_content, &query));
        assert_eq!(score(&in_title, &query), SCORE_TITLE);
        assert_eq!(score(&in_content, &query), SCORE_CONTENT);
    }

    #[test]
    fn all_terms_required() {
        let query = RankedQuery::parse("remix loaders");
        let both = post(PostType::Article, "Remix", "loaders explained");
        let only_one = post(PostType::Article, "Remix", "actions explained");
        assert!(matches(&both, &query));
        assert!(!matches(&only_one, &query));
    }

    #[test]
    fn phrase_is_exact() {
        let query = RankedQuery::parse("\"remix loaders\"");
        let exact = post(PostType::Article, "Remix loaders in practice", "");
        let scattered = post(PostType::Article, "Remix", "loaders explained");
        assert!(matches(&exact, &query));
        assert!(!matches(&scattered, &query));
    }

    #[test]
    fn bookmarks_do_not_search_content() {
        let query = RankedQuery::parse("remix");
        let bookmark = post(PostType::Bookmark, "A link", "remix in the notes");
        assert!(!matches(&bookmark, &query));
    }

    #[test]
    fn glossary_searches_term_and_definition() {
        let query = RankedQuery::parse("hydration");
        let mut entry = post(PostType::Glossary, "", "");
        entry.term = "Hydration".to_owned();
        entry.definition = "Attaching behavior to server-rendered HTML".to_owned();
        assert!(matches(&entry, &query));
        assert_eq!(score(&entry, &query), SCORE_TITLE);

        let query = RankedQuery::parse("server-rendered");
        assert_eq!(score(&entry, &query), SCORE_DEFINITION);
    }
}
