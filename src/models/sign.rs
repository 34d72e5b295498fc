//! Reconciled sign data structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Globally unique identifier of one physical sign.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignIdentity(String);

impl SignIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignIdentity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What a sign is currently showing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayType {
    #[default]
    Blank,
    Unknown,
    SpeedLimit,
    RestrictionEnd,
    LaneClosed,
    /// Green arrow
    LaneOpen,
    LaneClosedAhead,
}

impl DisplayType {
    pub const ALL: [DisplayType; 7] = [
        DisplayType::Blank,
        DisplayType::Unknown,
        DisplayType::SpeedLimit,
        DisplayType::RestrictionEnd,
        DisplayType::LaneClosed,
        DisplayType::LaneOpen,
        DisplayType::LaneClosedAhead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayType::Blank => "BLANK",
            DisplayType::Unknown => "UNKNOWN",
            DisplayType::SpeedLimit => "SPEED_LIMIT",
            DisplayType::RestrictionEnd => "RESTRICTION_END",
            DisplayType::LaneClosed => "LANE_CLOSED",
            DisplayType::LaneOpen => "LANE_OPEN",
            DisplayType::LaneClosedAhead => "LANE_CLOSED_AHEAD",
        }
    }
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::load(format!("unknown display type '{s}' in snapshot")))
    }
}

/// Side traffic has to merge to when a lane closes ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeDirection {
    Left,
    Right,
}

impl MergeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeDirection::Left => "LEFT",
            MergeDirection::Right => "RIGHT",
        }
    }
}

impl FromStr for MergeDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LEFT" => Ok(MergeDirection::Left),
            "RIGHT" => Ok(MergeDirection::Right),
            other => Err(AppError::load(format!(
                "unknown merge direction '{other}' in snapshot"
            ))),
        }
    }
}

/// Fully merged state of one physical sign.
///
/// Location fields are only ever written by a location event, so a sign
/// that was seen through display events alone keeps them empty. Display
/// attributes are merged per field: switching the classification does not
/// clear attributes an earlier display event set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignRecord {
    pub uuid: SignIdentity,

    #[serde(rename = "type")]
    pub display_type: DisplayType,

    pub road: Option<String>,
    pub carriageway: Option<String>,
    pub lane: Option<i32>,

    /// Distance marker in kilometres
    pub km: Option<f64>,

    pub speed_limit: Option<u32>,
    pub is_flashing: Option<bool>,
    pub has_red_ring: Option<bool>,
    pub arrow_direction: Option<MergeDirection>,
}

impl SignRecord {
    /// Empty record for an identity that has not contributed any fields yet.
    pub fn new(uuid: SignIdentity) -> Self {
        Self {
            uuid,
            display_type: DisplayType::Blank,
            road: None,
            carriageway: None,
            lane: None,
            km: None,
            speed_limit: None,
            is_flashing: None,
            has_red_ring: None,
            arrow_direction: None,
        }
    }

    /// Whether every location field has been populated.
    pub fn has_location(&self) -> bool {
        self.road.is_some()
            && self.carriageway.is_some()
            && self.lane.is_some()
            && self.km.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_blank() {
        let record = SignRecord::new("a".into());
        assert_eq!(record.display_type, DisplayType::Blank);
        assert!(!record.has_location());
        assert!(record.speed_limit.is_none());
    }

    #[test]
    fn test_display_type_round_trips_through_str() {
        for kind in DisplayType::ALL {
            assert_eq!(kind.as_str().parse::<DisplayType>().unwrap(), kind);
        }
        assert!("GREEN".parse::<DisplayType>().is_err());
    }

    #[test]
    fn test_record_serializes_type_key() {
        let mut record = SignRecord::new("a".into());
        record.display_type = DisplayType::LaneClosedAhead;
        record.arrow_direction = Some(MergeDirection::Left);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["uuid"], "a");
        assert_eq!(json["type"], "LANE_CLOSED_AHEAD");
        assert_eq!(json["arrow_direction"], "LEFT");
    }
}
