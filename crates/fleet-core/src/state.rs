//! Driver state events and the vocabulary that normalizes them.
//!
//! The fleet API has shipped several state vocabularies over time
//! (`waiting_orders`/`has_order`/`inactive` in one version,
//! `active`/`busy`/`offline` in another). Every raw token goes through a
//! single [`StateVocabulary`] table before the reconstructor sees it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DriverId;

/// Canonical driver states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DriverState {
    /// Logged in and waiting for an order.
    #[serde(rename = "waiting")]
    OnlineWaiting,
    /// Logged in and serving an order.
    #[serde(rename = "engaged")]
    OnlineEngaged,
    /// Logged out.
    #[serde(rename = "offline")]
    Offline,
}

impl DriverState {
    /// Canonical token for this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnlineWaiting => "waiting",
            Self::OnlineEngaged => "engaged",
            Self::Offline => "offline",
        }
    }

    /// Returns true for either online state.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        !matches!(self, Self::Offline)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DriverState {
    type Err = UnknownDriverState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::OnlineWaiting),
            "engaged" => Ok(Self::OnlineEngaged),
            "offline" => Ok(Self::Offline),
            _ => Err(UnknownDriverState(s.to_string())),
        }
    }
}

/// Error type for unknown state tokens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown driver state: {0}")]
pub struct UnknownDriverState(pub String);

/// Raw tokens recognised out of the box.
const DEFAULT_VOCABULARY: &[(&str, DriverState)] = &[
    ("waiting_orders", DriverState::OnlineWaiting),
    ("active", DriverState::OnlineWaiting),
    ("online", DriverState::OnlineWaiting),
    ("available", DriverState::OnlineWaiting),
    ("has_order", DriverState::OnlineEngaged),
    ("busy", DriverState::OnlineEngaged),
    ("in_trip", DriverState::OnlineEngaged),
    ("engaged", DriverState::OnlineEngaged),
    ("inactive", DriverState::Offline),
    ("offline", DriverState::Offline),
    ("logged_out", DriverState::Offline),
];

/// Lookup table from raw vendor state tokens to [`DriverState`].
///
/// Keys are stored lowercase; lookups trim and lowercase the raw token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, DriverState>", into = "BTreeMap<String, DriverState>")]
pub struct StateVocabulary {
    table: BTreeMap<String, DriverState>,
}

impl StateVocabulary {
    /// An empty vocabulary. Every token is unknown.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Adds or replaces a mapping.
    #[must_use]
    pub fn with_alias(mut self, raw: &str, state: DriverState) -> Self {
        self.insert(raw, state);
        self
    }

    /// Adds or replaces a mapping in place.
    pub fn insert(&mut self, raw: &str, state: DriverState) {
        self.table.insert(normalize_token(raw), state);
    }

    /// Normalizes a raw token. Returns `None` for tokens not in the table.
    pub fn normalize(&self, raw: &str) -> Option<DriverState> {
        self.table.get(&normalize_token(raw)).copied()
    }

    /// Number of known tokens.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for StateVocabulary {
    fn default() -> Self {
        DEFAULT_VOCABULARY
            .iter()
            .fold(Self::empty(), |vocab, (raw, state)| {
                vocab.with_alias(raw, *state)
            })
    }
}

impl From<BTreeMap<String, DriverState>> for StateVocabulary {
    fn from(map: BTreeMap<String, DriverState>) -> Self {
        map.into_iter()
            .fold(Self::empty(), |vocab, (raw, state)| {
                vocab.with_alias(&raw, state)
            })
    }
}

impl From<StateVocabulary> for BTreeMap<String, DriverState> {
    fn from(vocab: StateVocabulary) -> Self {
        vocab.table
    }
}

fn normalize_token(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// A single state-change signal for a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEvent {
    /// The driver whose state changed.
    pub driver_id: DriverId,
    /// When the change was recorded (epoch seconds on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// The vendor's state token, before normalization.
    pub raw_state: String,
}

impl StateEvent {
    /// Creates a state event.
    pub fn new(driver_id: DriverId, timestamp: DateTime<Utc>, raw_state: impl Into<String>) -> Self {
        Self {
            driver_id,
            timestamp,
            raw_state: raw_state.into(),
        }
    }
}
