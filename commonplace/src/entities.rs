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

//! # commonplace models
//!
//! ## Introduction
//!
//! The site stores everything it publishes as a generic *post*-- an entity discriminated by a
//! `type` field whose free-form attributes live in an entity-attribute-value table (`post_id, key,
//! value`) rather than typed columns. That's convenient on the write side (new attributes need no
//! migration), but miserable to program against. This module is the antidote: EAV rows are decoded
//! into strongly-typed [Post]s at the repository boundary ([Post::from_rows]), and no EAV key
//! string survives past it. Everything downstream ([recommend], [search], [feed]) operates purely
//! on the types defined here.
//!
//! [recommend]: crate::recommend
//! [search]: crate::search
//! [feed]: crate::feed

use std::{fmt::Display, ops::Deref};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use snafu::{prelude::*, Backtrace};
use uuid::Uuid;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{text} is not a valid slug"))]
    BadSlug { text: String, backtrace: Backtrace },
    #[snafu(display("{text} is not a post type"))]
    BadPostType { text: String, backtrace: Backtrace },
    #[snafu(display("Post {id} has no slug attribute"))]
    MissingSlug { id: PostId, backtrace: Backtrace },
    #[snafu(display("Post {id} is not a tutorial (it's a {actual})"))]
    NotATutorial {
        id: PostId,
        actual: PostType,
        backtrace: Backtrace,
    },
}

type Result<T> = std::result::Result<T, Error>;

type StdResult<T, E> = std::result::Result<T, E>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                             PostId                                             //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// An opaque identifier for a [Post]
///
/// The EAV table has no auto-increment column to lean on, so the application assigns its own ids;
/// as is usual in that situation, they're UUIDs under the hood.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    pub fn new() -> PostId {
        PostId(Uuid::new_v4())
    }
    pub fn from_raw_string(s: &str) -> StdResult<PostId, uuid::Error> {
        Ok(PostId(Uuid::parse_str(s)?))
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

/// An opaque identifier for an author; posts only carry it, users live elsewhere.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AuthorId(Uuid);

impl AuthorId {
    pub fn new() -> AuthorId {
        AuthorId(Uuid::new_v4())
    }
    pub fn from_raw_string(s: &str) -> StdResult<AuthorId, uuid::Error> {
        Ok(AuthorId(Uuid::parse_str(s)?))
    }
}

impl Default for AuthorId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AuthorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            PostType                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The discriminator distinguishing the kinds of [Post] the site publishes
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostType {
    Article,
    Tutorial,
    Bookmark,
    Glossary,
}

impl PostType {
    /// The plural, URL-ish name for this post type; also the stem of the cache keys derived for
    /// queries over it ("tutorials:list", "feed:articles:search:...", &c).
    pub fn collection(&self) -> &'static str {
        match self {
            PostType::Article => "articles",
            PostType::Tutorial => "tutorials",
            PostType::Bookmark => "bookmarks",
            PostType::Glossary => "glossary",
        }
    }
}

impl Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostType::Article => write!(f, "article"),
            PostType::Tutorial => write!(f, "tutorial"),
            PostType::Bookmark => write!(f, "bookmark"),
            PostType::Glossary => write!(f, "glossary"),
        }
    }
}

impl std::str::FromStr for PostType {
    type Err = Error;

    fn from_str(s: &str) -> Result<PostType> {
        match s {
            "article" => Ok(PostType::Article),
            "tutorial" => Ok(PostType::Tutorial),
            "bookmark" => Ok(PostType::Bookmark),
            "glossary" => Ok(PostType::Glossary),
            _ => BadPostTypeSnafu { text: s.to_owned() }.fail(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                              Slug                                              //
////////////////////////////////////////////////////////////////////////////////////////////////////

lazy_static! {
    static ref SLUG: Regex = Regex::new("^[a-z0-9]+(-[a-z0-9]+)*$").unwrap(/* known good */);
}

/// A refined type for a post's URL-unique slug
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Construct a [Slug] from a `&str`; slugs are lowercase kebab-case ASCII.
    pub fn new(text: &str) -> Result<Slug> {
        SLUG.is_match(text)
            .then_some(Slug(text.to_owned()))
            .ok_or(
                BadSlugSnafu {
                    text: text.to_owned(),
                }
                .build(),
            )
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        self.deref()
    }
}

impl Deref for Slug {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Implemented by hand so that deserializing a malformed slug fails rather than smuggling garbage
// into the refined type.
impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Slug::new(&text).map_err(|err| <D::Error as serde::de::Error>::custom(format!("{err}")))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      EAV rows and posts                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// One row of the entity-attribute-value table backing posts
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AttrRow {
    pub key: String,
    pub value: String,
}

impl AttrRow {
    pub fn new(key: &str, value: &str) -> AttrRow {
        AttrRow {
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// A post, decoded from its EAV rows into typed fields
///
/// Attributes not set on the underlying entity decode to their `Default`s (empty strings, empty
/// vectors); the EAV store makes no promises about which keys are present. `term` & `definition`
/// are only meaningful for glossary entries, but live here rather than in a dedicated type because
/// the home feed ranks all four post types through one query.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Post {
    pub id: PostId,
    pub post_type: PostType,
    pub slug: Slug,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub term: String,
    pub definition: String,
    pub author_id: Option<AuthorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Decode a post from its EAV rows.
    ///
    /// This is the *only* place EAV key strings appear; everything downstream sees typed fields.
    /// The `tags` attribute may appear as a single row holding a JSON array, or as repeated rows
    /// under the same key (one tag each); both reduce to an ordered `Vec<String>` in row order.
    /// Unknown keys are ignored. A missing or malformed slug is an error-- a post we can't link to
    /// is useless-- but everything else defaults.
    pub fn from_rows(id: PostId, post_type: PostType, rows: &[AttrRow]) -> Result<Post> {
        let mut slug = None;
        let mut title = String::new();
        let mut excerpt = String::new();
        let mut content = String::new();
        let mut term = String::new();
        let mut definition = String::new();
        let mut tags = Vec::new();
        let mut author_id = None;
        let mut created_at = DateTime::UNIX_EPOCH;
        let mut updated_at = DateTime::UNIX_EPOCH;

        for row in rows {
            match row.key.as_str() {
                "slug" => slug = Some(Slug::new(&row.value)?),
                "title" => title = row.value.clone(),
                "excerpt" => excerpt = row.value.clone(),
                "content" => content = row.value.clone(),
                "term" => term = row.value.clone(),
                "definition" => definition = row.value.clone(),
                "tags" => match serde_json::from_str::<Vec<String>>(&row.value) {
                    Ok(mut array) => tags.append(&mut array),
                    Err(_) => tags.push(row.value.clone()),
                },
                "author" => author_id = AuthorId::from_raw_string(&row.value).ok(),
                "created-at" => {
                    if let Ok(dt) = DateTime::parse_from_rfc3339(&row.value) {
                        created_at = dt.with_timezone(&Utc);
                    }
                }
                "updated-at" => {
                    if let Ok(dt) = DateTime::parse_from_rfc3339(&row.value) {
                        updated_at = dt.with_timezone(&Utc);
                    }
                }
                _ => (),
            }
        }

        Ok(Post {
            id,
            post_type,
            slug: slug.ok_or(MissingSlugSnafu { id }.build())?,
            title,
            excerpt,
            content,
            tags,
            term,
            definition,
            author_id,
            created_at,
            updated_at,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            Tutorial                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A typed view of a [Post] whose `post_type` is [Tutorial](PostType::Tutorial)
///
/// Only tutorials carry meaningful technology tags, and only tutorials flow through the
/// recommendation & tag-filtered search paths, so it's worth a dedicated type to say so.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Tutorial {
    pub id: PostId,
    pub slug: Slug,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub author_id: Option<AuthorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Post> for Tutorial {
    type Error = Error;

    fn try_from(post: Post) -> Result<Tutorial> {
        ensure!(
            post.post_type == PostType::Tutorial,
            NotATutorialSnafu {
                id: post.id,
                actual: post.post_type,
            }
        );
        Ok(Tutorial {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            tags: post.tags,
            author_id: post.author_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }
}


#[cfg(test)]
mod check_from_rows {
    use super::*;

    #[test]
    fn tags_as_json_array() {
        let rows = vec![
            AttrRow::new("slug", "react-hooks"),
            AttrRow::new("title", "React hooks"),
            AttrRow::new("tags", r#"["react@18.2.0","typescript@5.0.0"]"#),
        ];
        let post = Post::from_rows(PostId::new(), PostType::Tutorial, &rows).unwrap();
        assert_eq!(post.tags, vec!["react@18.2.0", "typescript@5.0.0"]);
    }

    #[test]
    fn tags_as_repeated_rows() {
        let rows = vec![
            AttrRow::new("slug", "react-hooks"),
            AttrRow::new("tags", "react@18.2.0"),
            AttrRow::new("tags", "typescript@5.0.0"),
        ];
        let post = Post::from_rows(PostId::new(), PostType::Tutorial, &rows).unwrap();
        assert_eq!(post.tags, vec!["react@18.2.0", "typescript@5.0.0"]);
    }

    #[test]
    fn missing_slug_is_an_error() {
        let rows = vec![AttrRow::new("title", "No slug here")];
        assert!(Post::from_rows(PostId::new(), PostType::Article, &rows).is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let rows = vec![
            AttrRow::new("slug", "a-post"),
            AttrRow::new("hero-image", "whatever.png"),
        ];
        let post = Post::from_rows(PostId::new(), PostType::Article, &rows).unwrap();
        assert_eq!(post.title, "");
        assert!(post.tags.is_empty());
    }
}
