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

//! # configuration
//!
//! The discovery engine's few knobs, deserialized from TOML. Everything defaults; a missing file
//! or an empty one yields a working configuration.

use std::{path::Path, time::Duration};

use serde::Deserialize;
use snafu::{prelude::*, Backtrace};
use tap::Pipe;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unable to read configuration file: {source}"))]
    ConfigFile {
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Error parsing configuration: {source}"))]
    ConfigParse {
        source: toml::de::Error,
        backtrace: Backtrace,
    },
}

type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Cache tuning
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a derived entry may live without being invalidated; the backstop bounding
    /// staleness (and orphaned fire-and-forget writes).
    #[serde(rename = "ttl-seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        // 24 hours
        CacheConfig { ttl_seconds: 86400 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        Some(Duration::from_secs(self.ttl_seconds))
    }
}

/// Discovery tuning
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// How many related tutorials to surface beneath a tutorial.
    #[serde(rename = "recommendation-limit")]
    pub recommendation_limit: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            recommendation_limit: 3,
        }
    }
}

/// The complete commonplace configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub cache: CacheConfig,
    pub discovery: DiscoveryConfig,
}

impl Configuration {
    pub fn from_str(text: &str) -> Result<Configuration> {
        toml::from_str(text).context(ConfigParseSnafu)
    }
    pub fn from_file(path: &Path) -> Result<Configuration> {
        std::fs::read_to_string(path)
            .context(ConfigFileSnafu)?
            .pipe(|text| Configuration::from_str(&text))
    }
}

#[cfg(test)]
mod check_config {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Configuration::from_str("").unwrap();
        assert_eq!(cfg.cache.ttl_seconds, 86400);
        assert_eq!(cfg.discovery.recommendation_limit, 3);
    }

    #[test]
    fn overrides() {
        let cfg = Configuration::from_str(
            r#"
[cache]
ttl-seconds = 600

[discovery]
recommendation-limit = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.cache.ttl_seconds, 600);
        assert_eq!(cfg.discovery.recommendation_limit, 5);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(Configuration::from_str("[cache\nttl").is_err());
    }
}
