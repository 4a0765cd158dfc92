//! Activity timeline segmentation.
//!
//! Scrubber and analytics views need the recording timeline cut into
//! alternating active/inactive stretches per window. Two pure passes build
//! it: [`get_active_segments_from_event_list`] derives maximal active runs
//! for one window from its activity signals, then
//! [`generate_inactive_segments_for_range`] fills the quiet ranges between
//! active runs, choosing for every moment a window that was actually
//! recording so playback always has something to show.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::summary::{is_active_event, EventSummary};

/// A contiguous stretch of the recording timeline.
///
/// `start_time <= end_time` always holds; a single activity signal produces
/// a zero-duration segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSegment {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Window this stretch belongs to; `None` is the no-window group.
    pub window_id: Option<String>,

    pub is_active: bool,
}

/// Derive maximal active segments from one window's activity signals.
///
/// Events are sorted by timestamp here - chronological input is the
/// documented precondition, enforced at the boundary rather than assumed.
///
/// A segment stays open while activity keeps arriving within the threshold.
/// It closes at its last active timestamp (never at an inactivity signal's
/// timestamp) when either an inactivity signal lands at or past the
/// threshold, or the next activity signal is strictly past it - a short
/// quiet gap never splits a segment.
pub fn get_active_segments_from_event_list(
    events: &[EventSummary],
    window_id: Option<&str>,
    activity_threshold_seconds: i64,
) -> Vec<RecordingSegment> {
    let threshold = Duration::seconds(activity_threshold_seconds);
    let mut ordered: Vec<&EventSummary> = events.iter().collect();
    ordered.sort_by_key(|event| event.timestamp);

    let mut segments = Vec::new();
    let mut current: Option<RecordingSegment> = None;

    for event in ordered {
        let Some(timestamp) = DateTime::from_timestamp_millis(event.timestamp) else {
            continue;
        };
        if is_active_event(event) {
            let start_new = current
                .as_ref()
                .map_or(true, |segment| timestamp - segment.end_time > threshold);
            if start_new {
                segments.extend(current.take());
                current = Some(RecordingSegment {
                    start_time: timestamp,
                    end_time: timestamp,
                    window_id: window_id.map(str::to_owned),
                    is_active: true,
                });
            } else if let Some(segment) = current.as_mut() {
                segment.end_time = timestamp;
            }
        } else {
            let close = current
                .as_ref()
                .map_or(false, |segment| timestamp - segment.end_time >= threshold);
            if close {
                segments.extend(current.take());
            }
        }
    }
    segments.extend(current);
    segments
}

/// Fill `[range_start, range_end]` with inactive segments, attributing every
/// covered moment to a window that was recording at the time.
///
/// `activity_by_window` maps each window to its overall recorded interval
/// and must arrive sorted by interval start (caller-guaranteed); output
/// preserves that chronology. The window that was last active before the
/// range gets first pick while its recording still covers the cursor, so
/// playback doesn't switch windows without cause.
///
/// Fillers start 1ms after the boundary they follow, and the trailing filler
/// ends 1ms before `range_end` - except when `is_last_segment`, where it
/// runs to `range_end` exactly since no active segment follows. Stretches no
/// window recorded are left unfilled; if nothing at all was recorded in the
/// range, one filler spans it, attributed to the last active window.
pub fn generate_inactive_segments_for_range(
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    last_active_window_id: Option<&str>,
    activity_by_window: &IndexMap<Option<String>, RecordingSegment>,
    is_last_segment: bool,
) -> Vec<RecordingSegment> {
    let millisecond = Duration::milliseconds(1);
    let clamp_end = if is_last_segment {
        range_end
    } else {
        range_end - millisecond
    };

    let overlaps_range = activity_by_window
        .values()
        .any(|interval| interval.end_time > range_start && interval.start_time < range_end);
    if !overlaps_range {
        let start = range_start + millisecond;
        if clamp_end < start {
            return Vec::new();
        }
        return vec![RecordingSegment {
            start_time: start,
            end_time: clamp_end,
            window_id: last_active_window_id.map(str::to_owned),
            is_active: false,
        }];
    }

    let mut fillers = Vec::new();
    let mut cursor = range_start;
    loop {
        let candidates: Vec<(&Option<String>, &RecordingSegment)> = activity_by_window
            .iter()
            .filter(|(_, interval)| interval.end_time > cursor && interval.start_time < range_end)
            .collect();
        if candidates.is_empty() {
            break;
        }

        // Continuity first: keep showing the last active window while its
        // recording covers the cursor. Otherwise the first covering window
        // in table order, otherwise the earliest upcoming one.
        let picked = candidates
            .iter()
            .filter(|(_, interval)| interval.start_time <= cursor)
            .find(|(window, _)| window.as_deref() == last_active_window_id)
            .or_else(|| {
                candidates
                    .iter()
                    .find(|(_, interval)| interval.start_time <= cursor)
            })
            .or_else(|| candidates.first())
            .copied();
        let Some((window, interval)) = picked else {
            break;
        };

        let segment_start = (cursor + millisecond).max(interval.start_time);
        let segment_end = interval.end_time.min(clamp_end);
        if segment_end >= segment_start {
            fillers.push(RecordingSegment {
                start_time: segment_start,
                end_time: segment_end,
                window_id: window.clone(),
                is_active: false,
            });
        }
        cursor = interval.end_time;
        if cursor >= range_end {
            break;
        }
    }
    fillers
}
