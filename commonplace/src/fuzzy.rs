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

//! # fuzzy text matching
//!
//! ## Introduction
//!
//! An in-memory, typo-tolerant matcher over a collection of documents, each presented as a set of
//! weighted text [Field]s. The corpus here is small (one person's tutorials), so there's no index;
//! every search scores every document. Scores are *ascending*: 0.0 is a perfect match, and
//! documents scoring past the cutoff on any required term are dropped.
//!
//! The per-word similarity primitive is Jaro-Winkler (via [strsim]), chosen over plain edit
//! distance for its prefix bias-- "hook" should sit close to "hooks".
//!
//! ## Extended syntax
//!
//! A query wrapped entirely in double quotes is an *exact phrase*: the phrase must appear as a
//! case-insensitive substring of some field, with no fuzz applied. Anything else is tokenized on
//! whitespace, and every token is required (logical AND).

/// One searchable piece of a document
///
/// `weight` is in `(0, 1]`; 1.0 marks the most authoritative fields (titles). Less-weighty fields
/// can still match, they just rank behind.
#[derive(Clone, Debug)]
pub struct Field {
    pub text: String,
    pub weight: f64,
}

impl Field {
    pub fn new(text: &str, weight: f64) -> Field {
        Field {
            text: text.to_owned(),
            weight,
        }
    }
}

/// A matched document: its index in the input collection & its (ascending) score
#[derive(Clone, Debug)]
pub struct Match {
    pub index: usize,
    pub score: f64,
}

/// The matcher itself; holds the tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct Matcher {
    /// A term whose best per-field distance exceeds this is considered absent from the document.
    cutoff: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Matcher { cutoff: 0.35 }
    }
}

impl Matcher {
    pub fn new(cutoff: f64) -> Matcher {
        Matcher { cutoff }
    }
    /// Search `documents` for `query`; returns matches ordered by ascending score (ties broken by
    /// input order). An empty query matches every document perfectly.
    pub fn search(&self, query: &str, documents: &[Vec<Field>]) -> Vec<Match> {
        let query = query.trim().to_lowercase();

        let mut matches = if let Some(phrase) = exact_phrase(&query) {
            documents
                .iter()
                .enumerate()
                .filter_map(|(index, fields)| {
                    phrase_score(phrase, fields).map(|score| Match { index, score })
                })
                .collect::<Vec<Match>>()
        } else {
            let terms = query
                .split_whitespace()
                .map(|term| term.trim_matches(|c: char| !c.is_alphanumeric()))
                .filter(|term| !term.is_empty())
                .collect::<Vec<&str>>();
            documents
                .iter()
                .enumerate()
                .filter_map(|(index, fields)| {
                    self.terms_score(&terms, fields)
                        .map(|score| Match { index, score })
                })
                .collect::<Vec<Match>>()
        };

        matches.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        matches
    }
    /// Score a document against a tokenized query: every term must land within the cutoff in some
    /// field; the document's score is the mean of the per-term bests.
    fn terms_score(&self, terms: &[&str], fields: &[Field]) -> Option<f64> {
        if terms.is_empty() {
            return Some(0.0);
        }
        let mut total = 0.0;
        for term in terms {
            let mut best_raw = f64::MAX;
            let mut best_weighted = f64::MAX;
            for field in fields {
                let raw = field_distance(term, &field.text);
                let weighted = raw + field_penalty(field.weight);
                if raw < best_raw {
                    best_raw = raw;
                }
                if weighted < best_weighted {
                    best_weighted = weighted;
                }
            }
            if best_raw > self.cutoff {
                return None;
            }
            total += best_weighted;
        }
        Some(total / terms.len() as f64)
    }
}

/// If `query` is wrapped in double quotes, the phrase inside; `None` else.
fn exact_phrase(query: &str) -> Option<&str> {
    query
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|phrase| !phrase.is_empty())
}

/// Exact-phrase score: the best field penalty among fields containing the phrase verbatim
/// (case-insensitively); `None` if no field does.
fn phrase_score(phrase: &str, fields: &[Field]) -> Option<f64> {
    fields
        .iter()
        .filter(|field| field.text.to_lowercase().contains(phrase))
        .map(|field| field_penalty(field.weight))
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}

/// The ranking handicap for a field: 0.0 for weight 1.0, growing as weight shrinks. Kept small so
/// that it orders fields without drowning out actual text distance.
fn field_penalty(weight: f64) -> f64 {
    (1.0 - weight.clamp(0.0, 1.0)) * 0.1
}

/// Distance from `term` to the closest word of `text`; 0.0 = exact hit.
fn field_distance(term: &str, text: &str) -> f64 {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word_distance(term, word))
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(1.0)
}

fn word_distance(term: &str, word: &str) -> f64 {
    if term == word {
        0.0
    } else if word.contains(term) || term.contains(word) {
        // A partial-substring hit; nearly as good as exact, degrading with the length mismatch.
        let (short, long) = if term.len() < word.len() {
            (term.len(), word.len())
        } else {
            (word.len(), term.len())
        };
        0.3 * (1.0 - short as f64 / long as f64)
    } else {
        1.0 - strsim::jaro_winkler(term, word)
    }
}

#[cfg(test)]
mod check_matcher {
    use super::*;

    fn doc(title: &str, content: &str) -> Vec<Field> {
        vec![Field::new(title, 1.0), Field::new(content, 0.5)]
    }

    #[test]
    fn exact_word() {
        let docs = vec![
            doc("Intro to React hooks", ""),
            doc("Cooking with cast iron", ""),
        ];
        let matches = Matcher::default().search("hooks", &docs);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index, 0);
        assert_eq!(matches[0].score, 0.0);
    }

    #[test]
    fn typo_tolerance() {
        let docs = vec![doc("Intro to React hooks", "")];
        let matches = Matcher::default().search("hoks", &docs);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].score > 0.0);
    }

    #[test]
    fn all_terms_required() {
        let docs = vec![doc("Intro to React hooks", "")];
        assert_eq!(Matcher::default().search("react hooks", &docs).len(), 1);
        assert!(Matcher::default()
            .search("react zqxwv", &docs)
            .is_empty());
    }

    #[test]
    fn title_outranks_content() {
        let docs = vec![
            doc("Miscellany", "all about hooks and more"),
            doc("React hooks", "miscellany"),
        ];
        let matches = Matcher::default().search("hooks", &docs);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].index, 1);
    }

    #[test]
    fn exact_phrase() {
        let docs = vec![
            doc("Intro to React hooks", ""),
            doc("Hooks intro to React", ""),
        ];
        let matches = Matcher::default().search("\"intro to react\"", &docs);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index, 0);
        // No fuzz in phrase mode:
        assert!(Matcher::default()
            .search("\"intro to raect\"", &docs)
            .is_empty());
    }

    #[test]
    fn empty_query_matches_all() {
        let docs = vec![doc("A", ""), doc("B", "")];
        assert_eq!(Matcher::default().search("", &docs).len(), 2);
    }
}
