//! Completed-trip records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DriverId, TripId};

/// Lifecycle status of a trip. Only [`TripStatus::Finished`] trips count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TripStatus {
    Finished,
    Cancelled,
    /// Any other vendor status, kept verbatim.
    Other(String),
}

impl TripStatus {
    /// String representation as sent by the vendor.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Ok(match lower.as_str() {
            "finished" | "completed" => Self::Finished,
            "cancelled" | "canceled" | "client_cancelled" | "driver_cancelled"
            | "driver_did_not_respond" => Self::Cancelled,
            _ => Self::Other(lower),
        })
    }
}

/// How the rider paid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Cash,
    Card,
    /// Any other vendor payment method, kept verbatim.
    Other(String),
}

impl PaymentMethod {
    /// String representation as sent by the vendor.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Ok(match lower.as_str() {
            "cash" => Self::Cash,
            "card" | "in_app" | "bank_card" => Self::Card,
            _ => Self::Other(lower),
        })
    }
}

/// Serializes the string-backed enums above as plain strings.
macro_rules! string_serde {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(TripStatus);
string_serde!(PaymentMethod);

/// A single trip (order) as supplied by the trip data collaborator.
///
/// Old records can lack `accepted_at` or `distance_meters`. Such trips
/// still count toward order totals and earnings, but are left out of
/// duration estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip_id: TripId,
    pub driver_id: DriverId,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub distance_meters: Option<u32>,
    #[serde(default)]
    pub gross_price: f64,
    #[serde(default)]
    pub net_earnings: f64,
    #[serde(default)]
    pub commission: f64,
    pub payment_method: PaymentMethod,
    pub status: TripStatus,
}

impl TripRecord {
    /// Whether the trip participates in statistics.
    pub fn is_finished(&self) -> bool {
        self.status == TripStatus::Finished
    }

    /// Distance in kilometres; zero when unknown.
    pub fn distance_km(&self) -> f64 {
        self.distance_meters.map_or(0.0, |m| f64::from(m) / 1000.0)
    }

    /// Accept-to-finish span in seconds, when both ends are known and ordered.
    pub fn raw_duration_secs(&self) -> Option<i64> {
        let accepted = self.accepted_at?;
        let secs = (self.finished_at - accepted).num_seconds();
        (secs >= 0).then_some(secs)
    }
}
