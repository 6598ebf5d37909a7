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

//! # tutorial search
//!
//! ## Introduction
//!
//! The tutorial index page offers one search box that accepts both structured *tech filters* &
//! free text, mixed:
//!
//! ```text
//! hooks tech:react@18.0.0
//! ```
//!
//! means "tutorials whose tags are compatible with react >= 18.0.0, fuzzily matching 'hooks'".
//! Filters are extracted first ([TechFilter::extract]), applied sequentially (logical AND), and
//! whatever text remains runs through the [fuzzy](crate::fuzzy) matcher over title & content.
//!
//! ## Result shape
//!
//! Every path returns the same shape, [SearchHit]: the tutorial plus an optional score. `score` is
//! `None` exactly when the result was never ranked (filter-only or empty queries, which preserve
//! list order). Callers never need to discriminate result types at runtime.

use serde::{Deserialize, Serialize};

use crate::{
    entities::Tutorial,
    fuzzy::{Field, Matcher},
    tags::{compatible, Tag},
};

/// Weight of a tutorial's content relative to its title when ranking fuzzy matches.
const CONTENT_WEIGHT: f64 = 0.5;

/// A structured predicate extracted from the query string: `tech:name[@version]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TechFilter(Tag);

impl TechFilter {
    /// Pull every whitespace-delimited `tech:` token out of `query`, returning the filters & the
    /// free-text remainder.
    ///
    /// A bare `tech:name` (no version) constrains the name only. A token that parses to nothing at
    /// all (`tech:`, `tech:@`) is dropped rather than allowed to filter everything out.
    pub fn extract(query: &str) -> (Vec<TechFilter>, String) {
        let mut filters = Vec::new();
        let mut remainder = Vec::new();
        for token in query.split_whitespace() {
            match token.strip_prefix("tech:") {
                Some(spec) => {
                    let tag = match Tag::parse(spec) {
                        tag if !tag.name.is_empty() => tag,
                        _ => Tag::unversioned(spec),
                    };
                    if !tag.is_empty() {
                        filters.push(TechFilter(tag));
                    }
                }
                None => remainder.push(token),
            }
        }
        (filters, remainder.join(" "))
    }
    /// Does `tutorial` satisfy this filter? True iff at least one of its tags is compatible with
    /// the filter tag.
    pub fn admits(&self, tutorial: &Tutorial) -> bool {
        tutorial
            .tags
            .iter()
            .any(|tag| compatible(&Tag::parse(tag), &self.0))
    }
}

/// A search result: always this shape, on every path
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchHit {
    pub tutorial: Tutorial,
    /// Ascending relevance (0.0 = perfect); `None` when the result set was never ranked.
    pub score: Option<f64>,
}

/// Search `tutorials` with a mixed tech-filter/free-text `query`.
///
/// An empty query returns the candidates untouched & unscored; a filter-only query returns the
/// filtered set in list order; anything else ranks by ascending fuzzy score.
pub fn search(tutorials: &[Tutorial], query: &str) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return unscored(tutorials.iter());
    }

    let (filters, remainder) = TechFilter::extract(&query);

    let mut candidates = tutorials.iter().collect::<Vec<&Tutorial>>();
    for filter in &filters {
        candidates.retain(|tutorial| filter.admits(tutorial));
    }

    if remainder.is_empty() {
        return unscored(candidates.into_iter());
    }

    let documents = candidates
        .iter()
        .map(|tutorial| {
            vec![
                Field::new(&tutorial.title, 1.0),
                Field::new(&tutorial.content, CONTENT_WEIGHT),
            ]
        })
        .collect::<Vec<Vec<Field>>>();

    Matcher::default()
        .search(&remainder, &documents)
        .into_iter()
        .map(|found| SearchHit {
            tutorial: candidates[found.index].clone(),
            score: Some(found.score),
        })
        .collect()
}

fn unscored<'a>(tutorials: impl Iterator<Item = &'a Tutorial>) -> Vec<SearchHit> {
    tutorials
        .map(|tutorial| SearchHit {
            tutorial: tutorial.clone(),
            score: None,
        })
        .collect()
}
