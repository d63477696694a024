//! Qualitative labels for individual responses and average scores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Five-level rating, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "Sangat Kurang")]
    SangatKurang,
    #[serde(rename = "Kurang")]
    Kurang,
    #[serde(rename = "Netral")]
    Netral,
    #[serde(rename = "Baik")]
    Baik,
    #[serde(rename = "Sangat Baik")]
    SangatBaik,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::SangatKurang,
        Rating::Kurang,
        Rating::Netral,
        Rating::Baik,
        Rating::SangatBaik,
    ];

    /// Rating of a raw Likert response. Values outside `1..=5` have none.
    pub fn from_likert(value: u8) -> Option<Rating> {
        match value {
            1 => Some(Rating::SangatKurang),
            2 => Some(Rating::Kurang),
            3 => Some(Rating::Netral),
            4 => Some(Rating::Baik),
            5 => Some(Rating::SangatBaik),
            _ => None,
        }
    }

    pub fn likert_value(self) -> u8 {
        match self {
            Rating::SangatKurang => 1,
            Rating::Kurang => 2,
            Rating::Netral => 3,
            Rating::Baik => 4,
            Rating::SangatBaik => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::SangatKurang => "Sangat Kurang",
            Rating::Kurang => "Kurang",
            Rating::Netral => "Netral",
            Rating::Baik => "Baik",
            Rating::SangatBaik => "Sangat Baik",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Converts an average score into a [`Rating`].
///
/// | Range            | Rating        |
/// |------------------|---------------|
/// | < 1.0            | Sangat Kurang |
/// | 1.0 ..< 2.0      | Kurang        |
/// | 2.0 ..< 3.0      | Netral        |
/// | 3.0 ..< 4.0      | Baik          |
/// | >= 4.0           | Sangat Baik   |
///
/// Not clamped: any `f64` maps to a rating.
pub fn categorize(score: f64) -> Rating {
    match score {
        s if s < 1.0 => Rating::SangatKurang,
        s if s < 2.0 => Rating::Kurang,
        s if s < 3.0 => Rating::Netral,
        s if s < 4.0 => Rating::Baik,
        _ => Rating::SangatBaik,
    }
}

/// Four-level gauge used for per-category governance scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GaugeRating {
    #[serde(rename = "Sangat Kurang")]
    SangatKurang,
    #[serde(rename = "Cukup")]
    Cukup,
    #[serde(rename = "Baik")]
    Baik,
    #[serde(rename = "Sangat Baik")]
    SangatBaik,
}

impl GaugeRating {
    pub fn label(self) -> &'static str {
        match self {
            GaugeRating::SangatKurang => "Sangat Kurang",
            GaugeRating::Cukup => "Cukup",
            GaugeRating::Baik => "Baik",
            GaugeRating::SangatBaik => "Sangat Baik",
        }
    }
}

impl fmt::Display for GaugeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// | Range       | Gauge         |
/// |-------------|---------------|
/// | < 1.5       | Sangat Kurang |
/// | < 2.5       | Cukup         |
/// | < 3.5       | Baik          |
/// | >= 3.5      | Sangat Baik   |
pub fn gauge_rating(score: f64) -> GaugeRating {
    match score {
        s if s < 1.5 => GaugeRating::SangatKurang,
        s if s < 2.5 => GaugeRating::Cukup,
        s if s < 3.5 => GaugeRating::Baik,
        _ => GaugeRating::SangatBaik,
    }
}

/// Share of the maximum score reached by an average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fulfillment {
    pub fulfilled_pct: f64,
    pub unfulfilled_pct: f64,
    /// Fulfilled share above [`SATISFIED_ABOVE_PCT`].
    pub satisfied: bool,
}

pub const SATISFIED_ABOVE_PCT: f64 = 60.0;

const MAX_SCORE: f64 = 5.0;

/// Turns an average score into a fulfilled / unfulfilled split.
///
/// Non-positive averages count as 0% fulfilled.
pub fn fulfillment(average: f64) -> Fulfillment {
    let fulfilled_pct = if average > 0.0 {
        average / MAX_SCORE * 100.0
    } else {
        0.0
    };

    Fulfillment {
        fulfilled_pct,
        unfulfilled_pct: 100.0 - fulfilled_pct,
        satisfied: fulfilled_pct > SATISFIED_ABOVE_PCT,
    }
}
