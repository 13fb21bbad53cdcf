//! Projection of activities onto a single day, used to draw the daily pie.
//!
//! The day is treated as 1440 minutes. Activities of the reference day are placed at their
//! minute of day and everything between them is filled with gap segments. Nothing is clipped or
//! merged: an activity running past midnight keeps its whole duration, and overlapping activities
//! are drawn one after another, so the pie may add up to more than a day.

pub mod palette;

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::trace;

use crate::{
    activity::Activity,
    utils::time::{format_minutes, minute_of_day, MINUTES_IN_DAY},
};

use palette::{category_color, GAP_COLOR};

/// Activity placed on the minutes of its day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub start_minute: i64,
    pub duration: i64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PieSegment {
    /// Untracked time.
    Gap { minutes: i64 },
    Activity {
        minutes: i64,
        category: String,
        color: &'static str,
        label: String,
    },
}

impl PieSegment {
    fn gap(minutes: i64) -> Self {
        PieSegment::Gap { minutes }
    }

    fn activity(slot: TimeSlot) -> Self {
        PieSegment::Activity {
            minutes: slot.duration,
            color: category_color(&slot.category),
            label: format_minutes(slot.duration),
            category: slot.category,
        }
    }

    pub fn value(&self) -> i64 {
        match self {
            PieSegment::Gap { minutes } | PieSegment::Activity { minutes, .. } => *minutes,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PieSegment::Gap { .. } => GAP_COLOR,
            PieSegment::Activity { color, .. } => *color,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            PieSegment::Gap { .. } => None,
            PieSegment::Activity { category, .. } => Some(category.as_str()),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            PieSegment::Gap { .. } => None,
            PieSegment::Activity { label, .. } => Some(label.as_str()),
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, PieSegment::Gap { .. })
    }
}

/// Minutes spent on a category during the day. Used for the legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub minutes: i64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTimeline {
    pub segments: Vec<PieSegment>,
    /// Plain sum of durations, overlapping time is counted twice.
    pub total_tracked_minutes: i64,
    /// In order of first appearance on the timeline.
    pub category_totals: Vec<CategoryTotal>,
}

impl DailyTimeline {
    /// Sum of every segment. At least a whole day.
    pub fn total_value(&self) -> i64 {
        self.segments
            .iter()
            .fold(0i64, |total, v| total.saturating_add(v.value()))
    }
}

/// Activities that started on the reference's calendar day, sorted by their start minute. The
/// sort is stable so activities starting at the same minute keep their input order.
pub fn day_slots<Tz: TimeZone>(activities: &[Activity], reference: &DateTime<Tz>) -> Vec<TimeSlot> {
    let timezone = reference.timezone();
    let day = reference.date_naive();

    let mut slots = activities
        .iter()
        .filter_map(|activity| {
            let local = activity.timestamp.with_timezone(&timezone);
            (local.date_naive() == day).then(|| TimeSlot {
                start_minute: minute_of_day(local.time()),
                duration: activity.duration,
                category: activity.category.clone(),
            })
        })
        .collect::<Vec<_>>();
    slots.sort_by_key(|v| v.start_minute);
    slots
}

/// Builds the pie of the reference's day. Local time is the timezone of `reference`.
pub fn build_daily_timeline<Tz: TimeZone>(
    activities: &[Activity],
    reference: &DateTime<Tz>,
) -> DailyTimeline {
    let slots = day_slots(activities, reference);

    // Durations come from the backend unchecked, every sum saturates.
    let total_tracked_minutes = slots
        .iter()
        .fold(0i64, |total, v| total.saturating_add(v.duration));
    let category_totals = category_totals(&slots);

    let mut segments = Vec::with_capacity(slots.len() * 2 + 1);
    let mut cursor = 0;
    for slot in slots {
        if slot.start_minute > cursor {
            segments.push(PieSegment::gap(slot.start_minute.saturating_sub(cursor)));
        }
        cursor = slot.start_minute.saturating_add(slot.duration);
        segments.push(PieSegment::activity(slot));
    }
    if cursor < MINUTES_IN_DAY {
        segments.push(PieSegment::gap(MINUTES_IN_DAY.saturating_sub(cursor)));
    }

    trace!(
        "Built {} segments for {}, {total_tracked_minutes} minutes tracked",
        segments.len(),
        reference.date_naive()
    );

    DailyTimeline {
        segments,
        total_tracked_minutes,
        category_totals,
    }
}

fn category_totals(slots: &[TimeSlot]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = vec![];
    for slot in slots {
        match totals.iter_mut().find(|v| v.category == slot.category) {
            Some(total) => total.minutes = total.minutes.saturating_add(slot.duration),
            None => totals.push(CategoryTotal {
                category: slot.category.clone(),
                minutes: slot.duration,
                color: category_color(&slot.category),
            }),
        }
    }
    totals
}
