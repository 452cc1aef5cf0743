pub mod games;
pub mod health;
pub mod roster;
pub mod standings;

use serde::Deserialize;

/// Body of the `.../active` endpoints.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncludeInactiveParams {
    #[serde(default)]
    pub include_inactive: bool,
}
