use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Wire/disk shapes are camelCase so the persisted file stays readable by
// older frontends: { startAt, totalMinutes, segments: [{ closingHint, ... }] }.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub minutes: f64,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub interaction: String,
    #[serde(default)]
    pub conversion: String,
    #[serde(default)]
    pub closing_hint: String,
}

/// The full editable configuration: start time, total minutes, segment list.
/// Mirrored to disk on every edit; loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableState {
    #[serde(default)]
    pub start_at: String, // "" or local "YYYY-MM-DDTHH:MM"
    #[serde(default)]
    pub total_minutes: f64,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// One derived, read-only entry of a generated timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineNode {
    pub idx: usize, // 1-based
    pub segment_key: String,
    pub segment_title: String,
    pub t_offset_min: f64,
    pub absolute_text: Option<String>, // local "HH:MM", None when start unknown
    pub relative_text: String,         // "T+8m" / "T+1h30m" / "T+2h"
    pub goal: String,
    pub script: String,
    pub interaction: String,
    pub conversion: String,
    pub closing_hint: String,
}

/// Result of one "generate" action. Replaced wholesale on each generation;
/// only `start_at_ms` may be updated in place when the user moves the start
/// time without regenerating.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTimeline {
    pub id: Uuid,
    pub nodes: Vec<TimelineNode>,
    pub start_at_ms: Option<i64>,
    pub total_minutes: f64,
    pub generated_at: DateTime<FixedOffset>,
}

pub const DEFAULT_TOTAL_MINUTES: f64 = 90.0;

pub fn default_state() -> EditableState {
    EditableState {
        start_at: String::new(),
        total_minutes: DEFAULT_TOTAL_MINUTES,
        segments: default_segments(),
    }
}

// Built-in four-phase script used when nothing has been persisted yet.
pub fn default_segments() -> Vec<Segment> {
    vec![
        Segment {
            key: "opening".into(),
            title: "开场".into(),
            minutes: 8.0,
            goal: "建立信任、说明节奏、引导关注".into(),
            script: "家人们晚上好！今天这场我会用最短时间把重点讲清楚：先带大家看清需求→再把对比讲透→最后给到本场专属福利。\n先点个关注别走开，评论区打个“1”，我看看多少老朋友在。".into(),
            interaction: "评论区打“1”报到；问：你更关注【价格】还是【效果/体验】？".into(),
            conversion: "引导加购/收藏：先把链接挂上，先加购物车不吃亏；强调直播节奏：福利会分批放".into(),
            closing_hint: "开场最后 30 秒做一次节奏确认与福利预告".into(),
        },
        Segment {
            key: "interaction".into(),
            title: "互动".into(),
            minutes: 22.0,
            goal: "拉高停留、制造参与感、收集用户偏好".into(),
            script: "我先做个小调查：你们最怕踩坑的点是什么？\nA 质量不稳定｜B 使用麻烦｜C 价格虚高｜D 售后不好\n评论区打字母，我按票数最高的先讲。".into(),
            interaction: "投票互动（A/B/C/D）；抽 3 位送小礼；引导提问：把你的使用场景发出来".into(),
            conversion: "引导私域/关注：想要对比清单的，关注后私信“清单”；承诺：我按大家的场景推荐".into(),
            closing_hint: "互动段末尾 1 分钟，把票数最高问题总结成 3 句话".into(),
        },
        Segment {
            key: "conversion".into(),
            title: "转化".into(),
            minutes: 48.0,
            goal: "讲清价值与差异、给出强理由、推动下单".into(),
            script: "核心就一句：如果你是【人群/场景】——选它最省心。\n我从三点讲：①关键参数/体验 ②对比同价位 ③本场福利怎么拿。\n现在把福利规则讲清楚：前 X 名/限时券/加赠是什么。".into(),
            interaction: "现场演示/对比；让用户选：你要【基础款】还是【进阶款】？评论区打“基础/进阶”".into(),
            conversion: "明确行动：点小黄车第 1 个；强调限时：倒计时结束恢复原价；复述保障：运费险/退换/质保".into(),
            closing_hint: "转化段每 8–10 分钟做一次“复盘+行动口令”".into(),
        },
        Segment {
            key: "closing".into(),
            title: "收尾".into(),
            minutes: 12.0,
            goal: "最后一波成交、降低退款风险、引导复访".into(),
            script: "最后 10 分钟我们把重点再过一遍：适合谁、不适合谁、怎么选。\n已经拍到的家人，按我说的使用/注意事项来，效果更稳。\n还没拍的，现在是最后一轮福利。".into(),
            interaction: "回访提问：你下单的是哪个版本？留言我给你使用建议；提醒截图订单信息".into(),
            conversion: "最后催单：倒计时 3 分钟；给出最后口令；强调售后与发货时间".into(),
            closing_hint: "结束前 30 秒：感谢+下场预告+引导关注".into(),
        },
    ]
}
