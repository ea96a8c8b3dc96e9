use crate::models::domain::UserProfile;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to rank neighborhoods for a profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchNeighborhoodsRequest {
    pub profile: UserProfile,
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub limit: Option<u16>,
}
