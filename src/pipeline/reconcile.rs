// src/pipeline/reconcile.rs

//! Sign reconciliation.
//!
//! The feed lists every physical sign more than once: one event carries the
//! lane location, another the displayed content. [`reconcile`] folds those
//! events into exactly one [`SignRecord`] per [`SignIdentity`].
//!
//! Merging is per field and last-write-wins in input order. Fields an event
//! does not carry are left as they were on the record.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::models::{
    DisplayPayload, DisplayType, EventBody, LaneLocation, MergeDirection, RawSignEvent,
    SignIdentity, SignRecord,
};

/// Reconciled snapshot, one record per sign.
pub type SignMap = HashMap<SignIdentity, SignRecord>;

/// Merge events into one record per sign identity.
///
/// Every identity that appears gets an entry, even when its events carry no
/// usable fields. A location or speed limit that does not parse aborts the
/// whole batch with [`AppError::Parse`].
pub fn reconcile<'a>(events: impl IntoIterator<Item = &'a RawSignEvent>) -> Result<SignMap> {
    let mut signs = SignMap::new();

    for event in events {
        let record = signs
            .entry(event.sign_id.clone())
            .or_insert_with(|| SignRecord::new(event.sign_id.clone()));

        match &event.body {
            EventBody::Location(location) => apply_location(record, location)?,
            EventBody::Display(display) => apply_display(record, display)?,
            EventBody::Inert => {
                log::debug!("Event for {} carries no location or display", event.sign_id);
            }
        }
    }

    Ok(signs)
}

fn apply_location(record: &mut SignRecord, location: &LaneLocation) -> Result<()> {
    let km: f64 = parse_number("km", &location.km)?;
    // f64 parsing also accepts "NaN" and "inf"
    if !km.is_finite() {
        return Err(AppError::parse("km", location.km.as_str()));
    }
    record.km = Some(km);
    record.road = Some(location.road.clone());
    record.lane = Some(parse_number("lane", &location.lane)?);
    record.carriageway = Some(location.carriageway.clone());
    Ok(())
}

/// Apply a display event.
///
/// The sub-elements are checked in a fixed order and each present one
/// overwrites the classification, so with several present the last in this
/// order wins. When none is present the current classification stays, which
/// is BLANK for a sign without earlier display events.
fn apply_display(record: &mut SignRecord, display: &DisplayPayload) -> Result<()> {
    if let Some(speed) = &display.speedlimit {
        record.display_type = DisplayType::SpeedLimit;
        record.speed_limit = Some(parse_number(
            "speedlimit",
            speed.text.as_deref().unwrap_or_default(),
        )?);
        record.has_red_ring = Some(speed.flag("red_ring"));
        record.is_flashing = Some(speed.flag("flashing"));
    }
    if display.lane_open.is_some() {
        record.display_type = DisplayType::LaneOpen;
    }
    if display.lane_closed.is_some() {
        record.display_type = DisplayType::LaneClosed;
    }
    if let Some(ahead) = &display.lane_closed_ahead {
        record.display_type = DisplayType::LaneClosedAhead;
        record.arrow_direction = Some(if ahead.merge_left {
            MergeDirection::Left
        } else {
            MergeDirection::Right
        });
        record.is_flashing = Some(ahead.aspect.flag("flashing"));
    }
    if display.restriction_end.is_some() {
        record.display_type = DisplayType::RestrictionEnd;
    }
    if display.unknown {
        record.display_type = DisplayType::Unknown;
    }
    Ok(())
}

fn parse_number<T: FromStr>(field: &'static str, text: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| AppError::parse(field, text))
}
