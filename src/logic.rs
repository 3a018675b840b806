/*
Timeline derivation, validation and countdown math.
Module is independent from HTTP / Axum so it can be tested directly.
*/

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::models::{Segment, TimelineNode};

// Local -> FixedOffset using the current system offset.
pub fn now_fixed_offset() -> DateTime<FixedOffset> {
    let local = Local::now();
    let offset = *local.offset();
    local.with_timezone(&offset)
}

// Parse-or-default boundary for durations coming from forms or disk:
// negative and non-finite values count as 0. Fractional minutes are legal.
pub fn clamp_minutes(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

// Print a minute count without a trailing ".0" for whole values.
fn fmt_min(v: f64) -> String {
    if v == v.trunc() {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

// "T+" rendering of a relative offset:
//     0   -> T+0m
//     59  -> T+59m
//     120 -> T+2h
//     90  -> T+1h30m
pub fn minutes_to_rel_text(min: f64) -> String {
    let h = (min / 60.0).floor();
    let m = min - h * 60.0;
    if h <= 0.0 {
        format!("T+{}m", fmt_min(m))
    } else if m == 0.0 {
        format!("T+{}h", fmt_min(h))
    } else {
        format!("T+{}h{}m", fmt_min(h), fmt_min(m))
    }
}

/// Zero-padded local wall-clock "HH:MM" for an epoch-millisecond instant.
/// None only when the instant is outside chrono's representable range.
pub fn format_hhmm_local(ms: i64) -> Option<String> {
    let utc = DateTime::from_timestamp_millis(ms)?;
    Some(utc.with_timezone(&Local).format("%H:%M").to_string())
}

/// Full local date-time rendering of an epoch-millisecond instant, used in
/// export headers.
pub fn format_datetime_local(ms: i64) -> Option<String> {
    let utc = DateTime::from_timestamp_millis(ms)?;
    Some(
        utc.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}

/// Parse a local date-time string from the start-time input
/// ("YYYY-MM-DDTHH:MM", seconds optional) into epoch milliseconds.
/// Empty or unparseable input means the start instant is unknown.
pub fn parse_start_at_ms(value: &str) -> Option<i64> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M"))
        .ok()?;
    let local = Local.from_local_datetime(&naive).single()?;
    Some(local.timestamp_millis())
}

/// Absolute instant of a node, as milliseconds from the epoch.
pub fn node_instant_ms(start_at_ms: i64, t_offset_min: f64) -> i64 {
    start_at_ms + (t_offset_min * 60_000.0) as i64
}

/// Derive the ordered timeline from the ordered segment list.
///
/// A cumulative-minutes cursor starts at 0; each node captures the cursor
/// value before its own duration is added. Pure: same inputs, same nodes.
pub fn build_timeline(segments: &[Segment], start_at_ms: Option<i64>) -> Vec<TimelineNode> {
    let mut nodes = Vec::with_capacity(segments.len());

    let mut cursor_min = 0.0_f64;
    for (i, s) in segments.iter().enumerate() {
        let absolute_text =
            start_at_ms.and_then(|start| format_hhmm_local(node_instant_ms(start, cursor_min)));
        nodes.push(TimelineNode {
            idx: i + 1,
            segment_key: s.key.clone(),
            segment_title: s.title.clone(),
            t_offset_min: cursor_min,
            absolute_text,
            relative_text: minutes_to_rel_text(cursor_min),
            goal: s.goal.clone(),
            script: s.script.clone(),
            interaction: s.interaction.clone(),
            conversion: s.conversion.clone(),
            closing_hint: s.closing_hint.clone(),
        });
        cursor_min += clamp_minutes(s.minutes);
    }

    nodes
}

#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub sum: f64,
    pub problems: Vec<String>,
}

impl Validation {
    pub fn ok(&self) -> bool {
        self.problems.is_empty()
    }
}

// Checks that generation may proceed. Problem order is fixed; callers that
// block on validation surface only the first entry.
pub fn validate(segments: &[Segment], total_minutes: f64) -> Validation {
    let sum: f64 = segments.iter().map(|s| clamp_minutes(s.minutes)).sum();
    let mut problems = Vec::new();
    if sum <= 0.0 {
        problems.push("各段时长不能为空。".to_string());
    }
    if total_minutes > 0.0 && sum != total_minutes {
        problems.push(format!(
            "各段时长之和为 {} 分钟，与你设置的总时长 {} 分钟不一致。",
            fmt_min(sum),
            fmt_min(total_minutes)
        ));
    }
    Validation { sum, problems }
}

/// First node whose absolute instant lies strictly in the future, in
/// timeline order. None once "now" is at or past the last node's instant.
pub fn find_next_node<'a>(
    nodes: &'a [TimelineNode],
    start_at_ms: i64,
    now_ms: i64,
) -> Option<&'a TimelineNode> {
    nodes
        .iter()
        .find(|n| node_instant_ms(start_at_ms, n.t_offset_min) > now_ms)
}

/// Remaining whole seconds until the target, rendered "MM:SS". Never
/// negative; minutes do not roll over into hours (90 min -> "90:00").
pub fn format_remaining(target_ms: i64, now_ms: i64) -> String {
    let left_sec = (target_ms - now_ms).max(0) / 1000;
    format!("{:02}:{:02}", left_sec / 60, left_sec % 60)
}
