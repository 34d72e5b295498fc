//! Typed feed events.
//!
//! The feed describes each physical sign through several `event` elements:
//! one carries the lane location, another the displayed content. These types
//! are the checked form of those elements; the raw tree is validated once by
//! [`crate::pipeline::extract`] and never probed again downstream.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::SignIdentity;

/// One `event` element from the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSignEvent {
    pub sign_id: SignIdentity,

    /// Raw `ts_event` text
    pub ts_event: Option<String>,

    /// Raw `ts_state` text
    pub ts_state: Option<String>,

    pub body: EventBody,
}

impl RawSignEvent {
    /// Parse `ts_event` as an RFC 3339 timestamp.
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        self.ts_event
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Payload of an event, decided by which child element it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    /// `lanelocation` element
    Location(LaneLocation),
    /// `display` element
    Display(DisplayPayload),
    /// Neither; contributes no fields
    Inert,
}

/// Unparsed lane location texts.
///
/// Numbers stay as text here; converting them is part of reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneLocation {
    pub road: String,
    pub carriageway: String,
    pub lane: String,
    pub km: String,
}

/// Text and attributes of a single display sub-element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayAspect {
    pub text: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl DisplayAspect {
    /// A boolean attribute is set only when its value is exactly `"true"`.
    pub fn flag(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|v| v == "true")
    }
}

/// `lane_closed_ahead` sub-element with its merge arrow markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneClosedAhead {
    pub aspect: DisplayAspect,
    pub merge_left: bool,
    pub merge_right: bool,
}

/// Content of a `display` element.
///
/// The feed normally carries one sub-element per display, but nothing in the
/// schema forbids several, so each one is kept independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayPayload {
    pub blank: Option<DisplayAspect>,
    pub speedlimit: Option<DisplayAspect>,
    pub lane_open: Option<DisplayAspect>,
    pub lane_closed: Option<DisplayAspect>,
    pub lane_closed_ahead: Option<LaneClosedAhead>,
    pub restriction_end: Option<DisplayAspect>,
    pub unknown: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspect(attrs: &[(&str, &str)]) -> DisplayAspect {
        DisplayAspect {
            text: None,
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_flag_requires_literal_true() {
        assert!(aspect(&[("flashing", "true")]).flag("flashing"));
        assert!(!aspect(&[("flashing", "false")]).flag("flashing"));
        assert!(!aspect(&[("flashing", "")]).flag("flashing"));
        assert!(!aspect(&[("flashing", "TRUE")]).flag("flashing"));
        assert!(!aspect(&[]).flag("flashing"));
    }

    #[test]
    fn test_event_time() {
        let event = RawSignEvent {
            sign_id: "a".into(),
            ts_event: Some("2024-03-01T10:15:00Z".to_string()),
            ts_state: None,
            body: EventBody::Inert,
        };
        let time = event.event_time().unwrap();
        assert_eq!(time.to_rfc3339(), "2024-03-01T10:15:00+00:00");

        let garbled = RawSignEvent {
            ts_event: Some("yesterday".to_string()),
            ..event
        };
        assert!(garbled.event_time().is_none());
    }
}
