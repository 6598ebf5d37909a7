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

//! # technology tags
//!
//! ## The grammar
//!
//! Tutorials carry free-form "technology tags" naming a package & the version the tutorial was
//! written against:
//!
//! ```text
//! react@18.2.0                unscoped
//! @remix-run/react@1.10.0     scoped
//! ```
//!
//! The grammar is ambiguous-- `@` is both the scope marker and the name/version separator-- which
//! is why parsing lives here, in one place, rather than being re-derived at every call site. Years
//! of hand-entered tag data are already persisted, some of it garbage; [Tag::parse] is therefore a
//! *total* function. Malformed input parses to an empty [Tag] (and is logged at `debug`), never an
//! error.
//!
//! ## Compatibility
//!
//! One tag is *compatible with* (recommendable against) another when it names the same technology
//! at a semantically greater-or-equal version ([is_compatible]). Version precedence is SemVer 2.0,
//! through the [semver] crate; a version string that won't parse simply fails the comparison
//! closed. Lexical string comparison is *not* an acceptable substitute ("9.0.0" sorts after
//! "10.0.0").

use semver::Version;
use tracing::debug;

use crate::util::exactly_two;

/// A technology tag, parsed into its name & version
///
/// Either component may be empty: an empty `version` on a *reference* tag means "any version"; an
/// empty `name` means the tag was garbage & will match nothing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tag {
    pub name: String,
    pub version: String,
}

impl Tag {
    /// Parse a tag string; total, never fails.
    ///
    /// Unscoped tags must split on `@` into exactly two pieces. Scoped tags (leading `@`) take
    /// everything between the first & second `@` as the name (scope marker restored) & everything
    /// after the second `@` as the version. Anything else-- empty input, a lone `@`, a bare name
    /// with no version-- soft-fails to an empty [Tag].
    pub fn parse(text: &str) -> Tag {
        if text.is_empty() || text == "@" {
            return Tag::default();
        }
        let parsed = match text.strip_prefix('@') {
            Some(rest) => exactly_two(rest.splitn(2, '@'))
                .ok()
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, version)| Tag {
                    name: format!("@{name}"),
                    version: version.to_owned(),
                }),
            None => exactly_two(text.splitn(2, '@'))
                .ok()
                .map(|(name, version)| Tag {
                    name: name.to_owned(),
                    version: version.to_owned(),
                }),
        };
        parsed.unwrap_or_else(|| {
            debug!("failed to parse {text:?} as a technology tag");
            Tag::default()
        })
    }
    /// A reference tag constraining the name only ("any version of `name`")
    pub fn unversioned(name: &str) -> Tag {
        Tag {
            name: name.to_owned(),
            version: String::new(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.version.is_empty()
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.version)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         compatibility                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Is `candidate` compatible with `reference`? Both are parsed through [Tag::parse] first.
pub fn is_compatible(candidate: &str, reference: &str) -> bool {
    compatible(&Tag::parse(candidate), &Tag::parse(reference))
}

/// Is `candidate` compatible with `reference`?
///
/// Names must match exactly, unless the reference name carries a `*` wildcard marker, in which
/// case the candidate name need only *contain* the reference name with the `*` stripped. A
/// reference with no version is unconstrained. Otherwise the candidate's version must be
/// semantically >= the reference's; a version that won't parse as SemVer fails the comparison
/// (there is no fallback to lexical ordering).
pub fn compatible(candidate: &Tag, reference: &Tag) -> bool {
    let names_match = if reference.name.contains('*') {
        let stripped = reference.name.replace('*', "");
        !stripped.is_empty() && candidate.name.contains(&stripped)
    } else {
        !reference.name.is_empty() && candidate.name == reference.name
    };
    if !names_match {
        return false;
    }
    if reference.version.is_empty() {
        return true;
    }
    match (
        Version::parse(&candidate.version),
        Version::parse(&reference.version),
    ) {
        (Ok(cand), Ok(refr)) => cand >= refr,
        _ => false,
    }
}

#[cfg(test)]
mod check_parse {
    use super::*;

    #[test]
    fn unscoped() {
        assert_eq!(
            Tag::parse("react@18.2.0"),
            Tag {
                name: "react".to_owned(),
                version: "18.2.0".to_owned(),
            }
        );
        // The version is everything after the *first* '@'.
        assert_eq!(Tag::parse("a@b@c").version, "b@c");
    }

    #[test]
    fn scoped() {
        assert_eq!(
            Tag::parse("@remix-run/react@1.10.0"),
            Tag {
                name: "@remix-run/react".to_owned(),
                version: "1.10.0".to_owned(),
            }
        );
    }

    #[test]
    fn malformed() {
        assert_eq!(Tag::parse(""), Tag::default());
        assert_eq!(Tag::parse("@"), Tag::default());
        assert_eq!(Tag::parse("noatsign"), Tag::default());
        assert_eq!(Tag::parse("@scope-but-no-version"), Tag::default());
    }
}

#[cfg(test)]
mod check_compatible {
    use super::*;

    #[test]
    fn reflexive() {
        assert!(is_compatible("pkg@1.2.3", "pkg@1.2.3"));
        assert!(is_compatible(
            "@remix-run/react@1.10.0",
            "@remix-run/react@1.10.0"
        ));
    }

    #[test]
    fn ordering() {
        assert!(is_compatible("pkg@2.0.0", "pkg@1.0.0"));
        assert!(!is_compatible("pkg@1.0.0", "pkg@2.0.0"));
        // The case lexical comparison gets wrong:
        assert!(is_compatible("pkg@10.0.0", "pkg@9.0.0"));
        // Pre-release precedence per SemVer 2.0:
        assert!(is_compatible("pkg@1.0.0", "pkg@1.0.0-beta.1"));
        assert!(!is_compatible("pkg@1.0.0-alpha", "pkg@1.0.0"));
    }

    #[test]
    fn names_gate() {
        assert!(!is_compatible("vue@3.0.0", "react@1.0.0"));
    }

    #[test]
    fn wildcards() {
        assert!(compatible(
            &Tag::parse("react@18.2.0"),
            &Tag::parse("*react@1.0.0")
        ));
        assert!(compatible(
            &Tag::parse("@remix-run/react@1.10.0"),
            &Tag::parse("*react@1.0.0")
        ));
        assert!(!compatible(
            &Tag::parse("vue@3.0.0"),
            &Tag::parse("*react@1.0.0")
        ));
    }

    #[test]
    fn unconstrained_reference() {
        assert!(compatible(
            &Tag::parse("react@18.2.0"),
            &Tag::unversioned("react")
        ));
        // ...even when the candidate's version is itself garbage.
        assert!(compatible(
            &Tag::parse("react@not-a-version"),
            &Tag::unversioned("react")
        ));
    }

    #[test]
    fn garbage_fails_closed() {
        assert!(!is_compatible("pkg@newest", "pkg@1.0.0"));
        assert!(!is_compatible("pkg@1.0.0", "pkg@oldest"));
        assert!(!is_compatible("", "pkg@1.0.0"));
        assert!(!is_compatible("pkg@1.0.0", ""));
    }
}
