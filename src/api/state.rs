use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::{ConfigError, LeagueConfig};
use crate::storage::LeagueStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LeagueStore>,
    pub league: Arc<LeagueConfig>,
    pub offset: FixedOffset,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<LeagueStore>, league: LeagueConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            offset: league.offset()?,
            league: Arc::new(league),
            started_at: Utc::now(),
        })
    }

    /// Current wall-clock time at the venue.
    pub fn now_local(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}
