//! 教室记录模型
//!
//! 记录文件中的一个元素，整体按原始 JSON 对象保存，
//! 只有合并抓取结果时才改写 `schedule` 和 `no_calendar` 两个键：
//!
//! | 状态        | `no_calendar` | `schedule` |
//! |-------------|---------------|------------|
//! | 未抓取      | （原值）      | （原值）   |
//! | Scheduled   | `false`       | 课表对象   |
//! | Empty       | `true`        | `null`     |
//! | Unresolved  | `null`        | `null`     |

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use super::schedule::WeekSchedule;

const SCHEDULE_KEY: &str = "schedule";
const NO_CALENDAR_KEY: &str = "no_calendar";

/// 抓取后的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// 页面有课表
    Scheduled,
    /// 页面明确没有课表
    Empty,
    /// 抓取失败，不对真实情况做任何判断
    Unresolved,
}

/// 教室记录
///
/// 字段宽松读取：类型不符的字段当作缺省处理，不会让整次运行失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomRecord {
    fields: Map<String, JsonValue>,
}

impl RoomRecord {
    /// 新建一条未抓取的记录
    pub fn new(building: &str, room: &str, url: &str, offered: bool) -> Self {
        let mut fields = Map::new();
        fields.insert("building".to_string(), json!(building));
        fields.insert("room".to_string(), json!(room));
        fields.insert("url".to_string(), json!(url));
        fields.insert("offered".to_string(), json!(offered));
        Self { fields }
    }

    /// 原始字段
    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.fields
    }

    /// 是否参与抓取（按真值判断，缺省为否）
    pub fn is_offered(&self) -> bool {
        self.fields.get("offered").is_some_and(truthy)
    }

    /// 位置标签，用于进度输出
    pub fn label(&self) -> String {
        format!("{} {}", self.text_or_unknown("building"), self.text_or_unknown("room"))
    }

    pub fn url(&self) -> &str {
        self.fields
            .get("url")
            .and_then(JsonValue::as_str)
            .unwrap_or("")
    }

    /// 上次运行留下的状态；没有抓取过为 `None`
    pub fn schedule_state(&self) -> Option<ScheduleState> {
        match self.fields.get(NO_CALENDAR_KEY)? {
            JsonValue::Bool(false) => Some(ScheduleState::Scheduled),
            JsonValue::Bool(true) => Some(ScheduleState::Empty),
            JsonValue::Null => Some(ScheduleState::Unresolved),
            _ => None,
        }
    }

    /// `schedule` 键的原始值
    pub fn schedule(&self) -> Option<&JsonValue> {
        self.fields.get(SCHEDULE_KEY)
    }

    /// 当前课表，无法解析为一周课表时为 `None`
    pub fn week(&self) -> Option<WeekSchedule> {
        match self.schedule()? {
            JsonValue::Null => None,
            value => WeekSchedule::deserialize(value).ok(),
        }
    }

    pub fn mark_scheduled(&mut self, week: &WeekSchedule) -> serde_json::Result<()> {
        let value = serde_json::to_value(week)?;
        self.set_state(value, JsonValue::Bool(false));
        Ok(())
    }

    pub fn mark_empty(&mut self) {
        self.set_state(JsonValue::Null, JsonValue::Bool(true));
    }

    pub fn mark_unresolved(&mut self) {
        self.set_state(JsonValue::Null, JsonValue::Null);
    }

    // 已有的键原位覆盖，新键追加在末尾
    fn set_state(&mut self, schedule: JsonValue, no_calendar: JsonValue) {
        self.fields.insert(SCHEDULE_KEY.to_string(), schedule);
        self.fields.insert(NO_CALENDAR_KEY.to_string(), no_calendar);
    }

    fn text_or_unknown(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(JsonValue::Null) => "Unknown".to_string(),
            Some(JsonValue::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}
