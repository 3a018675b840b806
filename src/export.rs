// Plain-text export of a generated timeline: one script card per node,
// preceded by a header block. Consumed as a downloadable artifact.

use crate::logic;
use crate::models::{GeneratedTimeline, TimelineNode};

const BLOCK_DELIMITER: &str = "\n\n========================================\n\n";
const EMPTY_FIELD: &str = "（未填写）";

fn or_empty_placeholder(text: &str) -> &str {
    if text.is_empty() {
        EMPTY_FIELD
    } else {
        text
    }
}

/// Script-card rendering of one node, also used for per-card copy actions.
pub fn card_text(node: &TimelineNode) -> String {
    let when = match &node.absolute_text {
        Some(abs) => format!("{}（{}）", abs, node.relative_text),
        None => node.relative_text.clone(),
    };
    [
        format!("【{}. {}】", node.idx, node.segment_title),
        format!("时间：{}", when),
        String::new(),
        "目标：".to_string(),
        or_empty_placeholder(&node.goal).to_string(),
        String::new(),
        "主话术：".to_string(),
        or_empty_placeholder(&node.script).to_string(),
        String::new(),
        "互动设计：".to_string(),
        or_empty_placeholder(&node.interaction).to_string(),
        String::new(),
        "转化动作：".to_string(),
        or_empty_placeholder(&node.conversion).to_string(),
        String::new(),
        "段尾提醒：".to_string(),
        or_empty_placeholder(&node.closing_hint).to_string(),
    ]
    .join("\n")
}

/// The full downloadable artifact: header, then every card separated by a
/// fixed delimiter line.
pub fn build_txt(timeline: &GeneratedTimeline) -> String {
    let start_line = match timeline.start_at_ms {
        Some(ms) => logic::format_datetime_local(ms).unwrap_or_else(|| "未设置".to_string()),
        None => "未设置".to_string(),
    };
    let header = [
        "直播间脚本时间轴（导出）".to_string(),
        format!(
            "生成时间：{}",
            timeline.generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
        format!("直播开始时间：{}", start_line),
        format!("总时长（分钟）：{}", timeline.total_minutes),
        "----------------------------------------".to_string(),
    ]
    .join("\n");

    let body: Vec<String> = timeline.nodes.iter().map(card_text).collect();
    format!("{}\n\n{}\n", header, body.join(BLOCK_DELIMITER))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::logic::{build_timeline, now_fixed_offset};
    use crate::models::default_segments;

    fn timeline(start_at_ms: Option<i64>) -> GeneratedTimeline {
        GeneratedTimeline {
            id: Uuid::new_v4(),
            nodes: build_timeline(&default_segments(), start_at_ms),
            start_at_ms,
            total_minutes: 90.0,
            generated_at: now_fixed_offset(),
        }
    }

    #[test]
    fn card_text_carries_every_guidance_field() {
        let tl = timeline(None);
        let card = card_text(&tl.nodes[0]);

        assert!(card.starts_with("【1. 开场】"));
        assert!(card.contains("时间：T+0m"));
        assert!(card.contains(&tl.nodes[0].goal));
        assert!(card.contains(&tl.nodes[0].script));
        assert!(card.contains(&tl.nodes[0].interaction));
        assert!(card.contains(&tl.nodes[0].conversion));
        assert!(card.contains(&tl.nodes[0].closing_hint));
    }

    #[test]
    fn empty_fields_render_a_placeholder() {
        let mut tl = timeline(None);
        tl.nodes[0].goal.clear();
        let card = card_text(&tl.nodes[0]);
        assert!(card.contains("目标：\n（未填写）"));
    }

    #[test]
    fn export_header_marks_an_unset_start_time() {
        let txt = build_txt(&timeline(None));
        assert!(txt.contains("直播开始时间：未设置"));
        assert!(txt.contains("总时长（分钟）：90"));
        // One delimiter between each pair of the four cards.
        assert_eq!(txt.matches("========================================").count(), 3);
    }

    #[test]
    fn export_uses_absolute_times_when_start_is_known() {
        let tl = timeline(Some(1_700_000_000_000));
        let txt = build_txt(&tl);
        assert!(!txt.contains("未设置"));
        let abs = tl.nodes[0].absolute_text.as_deref().unwrap();
        assert!(txt.contains(&format!("时间：{}（T+0m）", abs)));
    }
}
