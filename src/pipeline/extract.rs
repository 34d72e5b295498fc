// src/pipeline/extract.rs

//! Event extraction.
//!
//! Walks the generic markup tree down to the list of sign events and checks
//! each one into a [`RawSignEvent`].

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    DisplayAspect, DisplayPayload, EventBody, LaneClosedAhead, LaneLocation, RawSignEvent,
    SignIdentity,
};
use crate::services::XmlNode;

/// Elements from the document root to the event container.
pub const EVENTS_PATH: [&str; 4] = [
    "SOAP:Envelope",
    "SOAP:Body",
    "ndw:NdwVms",
    "variable_message_sign_events",
];

const EVENT: &str = "event";

/// Extract all sign events in document order.
///
/// A missing path segment or an event that does not match the feed schema is
/// a [`AppError::Structure`]; it means the upstream format changed.
pub fn extract_events(document: &XmlNode) -> Result<Vec<RawSignEvent>> {
    let mut node = document;
    for (depth, name) in EVENTS_PATH.iter().enumerate() {
        node = node.child(name).ok_or_else(|| {
            AppError::structure(format!(
                "missing <{}> under /{}",
                name,
                EVENTS_PATH[..depth].join("/")
            ))
        })?;
    }

    let events = node.children_named(EVENT);
    if events.is_empty() {
        return Err(AppError::structure(format!(
            "no <{}> elements under /{}",
            EVENT,
            EVENTS_PATH.join("/")
        )));
    }

    let events = events
        .iter()
        .enumerate()
        .map(|(index, node)| parse_event(index, node))
        .collect::<Result<Vec<_>>>()?;

    match newest_event_time(&events) {
        Some(time) => log::debug!("Extracted {} events, newest from {}", events.len(), time),
        None => log::debug!("Extracted {} events", events.len()),
    }
    Ok(events)
}

fn newest_event_time(events: &[RawSignEvent]) -> Option<DateTime<Utc>> {
    events.iter().filter_map(RawSignEvent::event_time).max()
}

fn parse_event(index: usize, node: &XmlNode) -> Result<RawSignEvent> {
    let uuid = node
        .descend(&["sign_id", "uuid"])
        .and_then(|n| n.text.as_deref())
        .ok_or_else(|| AppError::structure(format!("event #{index} has no sign_id/uuid")))?;

    // lanelocation takes precedence when an event carries both
    let body = if let Some(location) = node.child("lanelocation") {
        EventBody::Location(parse_location(index, location)?)
    } else if let Some(display) = node.child("display") {
        EventBody::Display(parse_display(display))
    } else {
        EventBody::Inert
    };

    Ok(RawSignEvent {
        sign_id: SignIdentity::new(uuid),
        ts_event: node.child_text("ts_event").map(str::to_string),
        ts_state: node.child_text("ts_state").map(str::to_string),
        body,
    })
}

fn parse_location(index: usize, node: &XmlNode) -> Result<LaneLocation> {
    let field = |name: &str| -> Result<String> {
        node.child(name)
            .map(|n| n.text.clone().unwrap_or_default())
            .ok_or_else(|| {
                AppError::structure(format!("event #{index}: lanelocation has no <{name}>"))
            })
    };

    Ok(LaneLocation {
        road: field("road")?,
        carriageway: field("carriageway")?,
        lane: field("lane")?,
        km: field("km")?,
    })
}

fn parse_display(node: &XmlNode) -> DisplayPayload {
    DisplayPayload {
        blank: node.child("blank").map(aspect),
        speedlimit: node.child("speedlimit").map(aspect),
        lane_open: node.child("lane_open").map(aspect),
        lane_closed: node.child("lane_closed").map(aspect),
        lane_closed_ahead: node.child("lane_closed_ahead").map(|n| LaneClosedAhead {
            aspect: aspect(n),
            merge_left: n.has_child("merge_left"),
            merge_right: n.has_child("merge_right"),
        }),
        restriction_end: node.child("restriction_end").map(aspect),
        unknown: node.has_child("unknown"),
    }
}

fn aspect(node: &XmlNode) -> DisplayAspect {
    DisplayAspect {
        text: node.text.clone(),
        attributes: node.attributes.clone(),
    }
}
