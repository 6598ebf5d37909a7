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

//! # related-tutorial recommendations
//!
//! ## Introduction
//!
//! Beneath every tutorial the site shows up to three *related* tutorials: others sharing a
//! [compatible](crate::tags::compatible) technology tag. The relation is derived, never stored;
//! it's recomputed per request (behind the [cache](crate::cache), in practice).
//!
//! ## Randomization
//!
//! The matching is deliberately randomized: a tutorial tagged with five technologies has valid
//! neighbors along each of them, and always surfacing the same three would waste the other axes.
//! So we shuffle the reference tags, the candidate list, and each candidate's own tags before
//! matching, then shuffle once more on the way out. Repeated calls surface *different* valid
//! matches; that's a feature. The source of randomness is injected so that tests can seed it--
//! production wiring passes [rand::thread_rng].
//!
//! ## Diversity over exhaustiveness
//!
//! A technology appearing in many tutorials must not crowd out the rest: we record at most one
//! match per (reference tag, candidate) pair & deduplicate by slug with the cap applied *during*
//! deduplication, so early reference tags can't monopolize the result.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    entities::{Slug, Tutorial},
    tags::is_compatible,
};

/// One related tutorial, and the tag that related it
///
/// Derived & ephemeral; never persisted.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub slug: Slug,
    pub matched_tag: String,
}

/// Recommend up to `limit` tutorials related to `tutorial` by a compatible technology tag.
///
/// Never fails: garbage tag data soft-fails inside [is_compatible], a tutorial with no tags (or no
/// peers) simply yields an empty list.
pub fn recommend<R: Rng>(
    tutorial: &Tutorial,
    all_tutorials: &[Tutorial],
    limit: usize,
    rng: &mut R,
) -> Vec<Recommendation> {
    let mut candidates = all_tutorials
        .iter()
        .filter(|cand| cand.slug != tutorial.slug)
        .collect::<Vec<&Tutorial>>();

    let mut reference_tags = tutorial.tags.clone();
    reference_tags.shuffle(rng);

    let mut picks = Vec::new();
    for reference in &reference_tags {
        candidates.shuffle(rng);
        for candidate in &candidates {
            let mut candidate_tags = candidate.tags.clone();
            candidate_tags.shuffle(rng);
            if let Some(matched) = candidate_tags
                .iter()
                .find(|tag| is_compatible(tag, reference))
            {
                picks.push(Recommendation {
                    title: candidate.title.clone(),
                    slug: candidate.slug.clone(),
                    matched_tag: matched.clone(),
                });
            }
        }
    }

    // Dedup by slug, first occurrence wins, capping *during* the dedup so that a single
    // widely-shared tag can't fill the list before later reference tags get a look-in.
    let mut seen = std::collections::HashSet::new();
    let mut recommendations = Vec::new();
    for pick in picks {
        if recommendations.len() >= limit {
            break;
        }
        if seen.insert(pick.slug.clone()) {
            recommendations.push(pick);
        }
    }

    recommendations.shuffle(rng);
    recommendations.truncate(limit);
    recommendations
}
