// --------------------------------------------------
// Countdown engine: the shared session (current generated timeline +
// published countdown view) and the recurring poll worker that keeps the
// "up next" display accurate against wall-clock time.
//
// Invariant: at most one poll schedule is active per session. Starting
// while running cancels the previous schedule first; stopping only
// cancels polling and never touches the generated timeline.
// --------------------------------------------------

use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use serde::Serialize;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::logic;
use crate::models::GeneratedTimeline;

const POLL_INTERVAL_MS: u64 = 300;

/// What the "now playing / up next" display shows after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownView {
    pub next_idx: Option<usize>,
    pub next_title: String,
    pub next_meta: String,
    pub timer_text: String,
    pub finished: bool,
}

impl CountdownView {
    fn idle() -> Self {
        CountdownView {
            next_idx: None,
            next_title: "未生成".to_string(),
            next_meta: "请先生成脚本卡".to_string(),
            timer_text: "--:--".to_string(),
            finished: false,
        }
    }

    fn finished() -> Self {
        CountdownView {
            next_idx: None,
            next_title: "已到最后".to_string(),
            next_meta: "可准备结束与下场预告".to_string(),
            timer_text: "00:00".to_string(),
            finished: true,
        }
    }
}

/// Compute the view for one poll tick. Pure: inert without a start instant,
/// terminal once every node's instant is in the past.
pub fn tick_view(timeline: Option<&GeneratedTimeline>, now_ms: i64) -> CountdownView {
    let Some(tl) = timeline else {
        return CountdownView::idle();
    };
    let Some(start_at_ms) = tl.start_at_ms else {
        return CountdownView::idle();
    };

    let Some(next) = logic::find_next_node(&tl.nodes, start_at_ms, now_ms) else {
        return CountdownView::finished();
    };

    let target_ms = logic::node_instant_ms(start_at_ms, next.t_offset_min);
    let abs = logic::format_hhmm_local(target_ms).unwrap_or_default();
    CountdownView {
        next_idx: Some(next.idx),
        next_title: format!("{}. {}", next.idx, next.segment_title),
        next_meta: format!("{} · {}", abs, next.relative_text),
        timer_text: logic::format_remaining(target_ms, now_ms),
        finished: false,
    }
}

/// Explicitly-owned session state shared between the HTTP handlers and the
/// poll worker. Replaced-wholesale semantics: `replace_timeline` swaps the
/// whole generation; `set_start_at` is the one in-place update.
pub struct Session {
    timeline: RwLock<Option<GeneratedTimeline>>,
    view: RwLock<CountdownView>,
    poll: Mutex<Option<CancellationToken>>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            timeline: RwLock::new(None),
            view: RwLock::new(CountdownView::idle()),
            poll: Mutex::new(None),
        }
    }

    pub fn timeline(&self) -> Option<GeneratedTimeline> {
        self.timeline.read().unwrap().clone()
    }

    /// Install a new generation (or none, on reset) and refresh the view
    /// once so the display is current before any polling happens.
    pub fn replace_timeline(&self, timeline: Option<GeneratedTimeline>) {
        *self.timeline.write().unwrap() = timeline;
        self.refresh();
    }

    /// Move the start instant of the current generation without rebuilding
    /// its nodes. Returns false when there is no generation to update.
    pub fn set_start_at(&self, start_at_ms: Option<i64>) -> bool {
        let updated = {
            let mut guard = self.timeline.write().unwrap();
            match guard.as_mut() {
                Some(tl) => {
                    tl.start_at_ms = start_at_ms;
                    true
                }
                None => false,
            }
        };
        self.refresh();
        updated
    }

    pub fn view(&self) -> CountdownView {
        self.view.read().unwrap().clone()
    }

    pub fn is_running(&self) -> bool {
        self.poll.lock().unwrap().is_some()
    }

    /// One idempotent tick: recompute the view against the current time.
    pub fn refresh(&self) {
        let now_ms = Utc::now().timestamp_millis();
        let view = tick_view(self.timeline.read().unwrap().as_ref(), now_ms);
        *self.view.write().unwrap() = view;
    }

    /// Start polling: cancel any prior schedule, tick immediately, then
    /// tick every POLL_INTERVAL_MS until stopped.
    pub fn start(self: &Arc<Self>) {
        self.stop();
        self.refresh();

        let token = CancellationToken::new();
        *self.poll.lock().unwrap() = Some(token.clone());

        let session = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => session.refresh(),
                    _ = token.cancelled() => {
                        log::info!("countdown poll stopped");
                        break;
                    }
                }
            }
        });
        log::info!("countdown poll started ({POLL_INTERVAL_MS}ms interval)");
    }

    /// Cancel the active poll schedule, if any. The generated timeline and
    /// the last published view are left untouched.
    pub fn stop(&self) {
        if let Some(token) = self.poll.lock().unwrap().take() {
            token.cancel();
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::logic::{build_timeline, now_fixed_offset};
    use crate::models::{default_segments, Segment};

    fn seg(key: &str, minutes: f64) -> Segment {
        Segment {
            key: key.to_string(),
            title: key.to_string(),
            minutes,
            goal: String::new(),
            script: String::new(),
            interaction: String::new(),
            conversion: String::new(),
            closing_hint: String::new(),
        }
    }

    fn timeline(start_at_ms: Option<i64>) -> GeneratedTimeline {
        let segments = vec![seg("a", 8.0), seg("b", 22.0), seg("c", 48.0), seg("d", 12.0)];
        GeneratedTimeline {
            id: Uuid::new_v4(),
            nodes: build_timeline(&segments, start_at_ms),
            start_at_ms,
            total_minutes: 90.0,
            generated_at: now_fixed_offset(),
        }
    }

    #[test]
    fn tick_is_inert_without_timeline_or_start_instant() {
        assert_eq!(tick_view(None, 0), CountdownView::idle());

        let tl = timeline(None);
        assert_eq!(tick_view(Some(&tl), 0), CountdownView::idle());
    }

    #[test]
    fn tick_counts_down_to_the_next_boundary() {
        let t = 1_700_000_000_000_i64;
        let tl = timeline(Some(t));

        // 10 minutes in: next boundary is the 30-minute node, 20 min away.
        let view = tick_view(Some(&tl), t + 10 * 60_000);
        assert_eq!(view.next_idx, Some(3));
        assert_eq!(view.timer_text, "20:00");
        assert!(!view.finished);
        assert!(view.next_meta.ends_with("T+30m"));
    }

    #[test]
    fn tick_reaches_a_terminal_finished_state() {
        let t = 1_700_000_000_000_i64;
        let tl = timeline(Some(t));

        let view = tick_view(Some(&tl), t + 100 * 60_000);
        assert!(view.finished);
        assert_eq!(view.timer_text, "00:00");
        assert_eq!(view.next_idx, None);
    }

    #[test]
    fn ticks_are_idempotent() {
        let t = 1_700_000_000_000_i64;
        let tl = timeline(Some(t));
        let now = t + 5 * 60_000;
        assert_eq!(tick_view(Some(&tl), now), tick_view(Some(&tl), now));
    }

    #[tokio::test]
    async fn restart_cancels_the_previous_schedule() {
        let session = Arc::new(Session::new());
        session.replace_timeline(Some(timeline(Some(
            Utc::now().timestamp_millis() + 60 * 60_000,
        ))));

        session.start();
        let first = session.poll.lock().unwrap().clone().unwrap();
        session.start();
        let second = session.poll.lock().unwrap().clone().unwrap();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        session.stop();
        assert!(second.is_cancelled());
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let session = Arc::new(Session::new());
        session.stop();
        assert!(!session.is_running());
    }

    #[test]
    fn stopping_leaves_the_timeline_intact() {
        let session = Session::new();
        let tl = timeline(Some(1_700_000_000_000));
        session.replace_timeline(Some(tl.clone()));
        session.stop();
        assert_eq!(session.timeline().unwrap().id, tl.id);
    }

    #[test]
    fn start_at_updates_in_place_without_rebuilding() {
        let session = Session::new();
        assert!(!session.set_start_at(Some(0)));

        let tl = timeline(None);
        let nodes_before = tl.nodes.clone();
        session.replace_timeline(Some(tl));

        let t = Utc::now().timestamp_millis() + 60 * 60_000;
        assert!(session.set_start_at(Some(t)));

        let after = session.timeline().unwrap();
        assert_eq!(after.start_at_ms, Some(t));
        // Nodes are immutable once produced; only the start instant moved.
        assert_eq!(after.nodes, nodes_before);

        // The countdown comes alive against the new start instant.
        assert!(session.view().next_idx.is_some());
    }

    #[test]
    fn default_segments_make_a_four_node_timeline() {
        let nodes = build_timeline(&default_segments(), None);
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[3].t_offset_min, 78.0);
    }
}
