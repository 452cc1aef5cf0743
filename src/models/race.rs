//! Year race chart data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::PlayerId;

/// Metric accumulated week over week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceMetric {
    #[default]
    Wins,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown race metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for RaceMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wins" => Ok(RaceMetric::Wins),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for RaceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceMetric::Wins => write!(f, "wins"),
        }
    }
}

/// One player's cumulative line in the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSeries {
    pub player_id: PlayerId,
    pub name: String,

    /// Cumulative values aligned to `YearRace::weeks`
    pub values: Vec<f64>,
}

impl RaceSeries {
    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }
}

/// Cumulative per-week series for the top players of a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRace {
    pub year: i32,
    pub metric: RaceMetric,

    /// ISO week numbers that contain games, ascending
    pub weeks: Vec<u32>,

    pub series: Vec<RaceSeries>,
}

impl YearRace {
    pub fn empty(year: i32, metric: RaceMetric) -> Self {
        Self {
            year,
            metric,
            weeks: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}
