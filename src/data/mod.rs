//! Core data models for the top anime browser
//!
//! This module contains the list and detail records the rest of the application
//! works with, plus the display sentinels used when the upstream API leaves a
//! field out.

pub mod jikan;

pub use jikan::{with_deadline, DetailSource, FetchError, JikanClient, Page, PageSource};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of records the upstream API returns for a full page
pub const PAGE_SIZE: usize = 25;

/// Placeholder shown when an entry has no synopsis
pub const NO_SYNOPSIS: &str = "No synopsis available.";

/// Placeholder shown when the airing window is missing
pub const UNKNOWN_AIRED: &str = "Unknown";

/// Broadcast format of an anime entry
///
/// Serialized as the plain upstream label so cached lists stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnimeKind {
    Tv,
    Movie,
    Special,
    Ova,
    /// The upstream record had no type
    Unknown,
    /// Any other upstream label (ONA, Music, ...), kept verbatim
    Other(String),
}

impl AnimeKind {
    /// Kinds offered by the type filter, in display order
    pub const FILTERABLE: [AnimeKind; 5] = [
        AnimeKind::Tv,
        AnimeKind::Movie,
        AnimeKind::Special,
        AnimeKind::Ova,
        AnimeKind::Unknown,
    ];

    /// Maps an optional upstream `type` field to a kind
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            None | Some("") => AnimeKind::Unknown,
            Some("TV") => AnimeKind::Tv,
            Some("Movie") => AnimeKind::Movie,
            Some("Special") => AnimeKind::Special,
            Some("OVA") => AnimeKind::Ova,
            Some("Unknown") => AnimeKind::Unknown,
            Some(other) => AnimeKind::Other(other.to_string()),
        }
    }

    /// Returns the upstream label for this kind
    pub fn label(&self) -> &str {
        match self {
            AnimeKind::Tv => "TV",
            AnimeKind::Movie => "Movie",
            AnimeKind::Special => "Special",
            AnimeKind::Ova => "OVA",
            AnimeKind::Unknown => "Unknown",
            AnimeKind::Other(label) => label,
        }
    }

    /// Parses a user-supplied kind name, case-insensitively
    ///
    /// Only the filterable kinds are accepted.
    pub fn parse_filter_name(s: &str) -> Option<Self> {
        Self::FILTERABLE
            .iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(s))
            .cloned()
    }
}

impl From<String> for AnimeKind {
    fn from(label: String) -> Self {
        AnimeKind::from_label(Some(&label))
    }
}

impl From<AnimeKind> for String {
    fn from(kind: AnimeKind) -> Self {
        kind.label().to_string()
    }
}

impl fmt::Display for AnimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the top anime list
///
/// Built once from an upstream record and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// MyAnimeList id, stable across pages
    pub id: u32,
    pub title: String,
    /// Poster URL, empty when the API has none
    pub image_url: String,
    pub kind: AnimeKind,
    /// Episode count, `None` while unknown or airing
    pub episodes: Option<u32>,
    pub score: Option<f64>,
    pub rank: Option<u32>,
    pub synopsis: String,
}

impl ListItem {
    /// Episode count for display, `?` when unknown
    pub fn episodes_label(&self) -> String {
        episodes_label(self.episodes)
    }

    /// Score for display, `N/A` when unknown
    pub fn score_label(&self) -> String {
        score_label(self.score)
    }

    /// Rank for display, `#-` when unranked
    pub fn rank_label(&self) -> String {
        match self.rank {
            Some(rank) => format!("#{}", rank),
            None => "#-".to_string(),
        }
    }
}

/// Extended record for a single anime, loaded on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub id: u32,
    pub title: String,
    pub image_url: String,
    pub episodes: Option<u32>,
    pub score: Option<f64>,
    pub synopsis: String,
    /// Human-readable airing window, e.g. "Apr 3, 2009 to Jul 4, 2010"
    pub aired: String,
    /// Genre names in upstream order
    pub genres: Vec<String>,
    /// MyAnimeList page for the entry
    pub source_url: String,
}

impl DetailItem {
    pub fn episodes_label(&self) -> String {
        episodes_label(self.episodes)
    }

    pub fn score_label(&self) -> String {
        score_label(self.score)
    }
}

fn episodes_label(episodes: Option<u32>) -> String {
    episodes.map_or_else(|| "?".to_string(), |n| n.to_string())
}

fn score_label(score: Option<f64>) -> String {
    score.map_or_else(|| "N/A".to_string(), |s| s.to_string())
}
