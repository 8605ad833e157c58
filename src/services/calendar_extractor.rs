//! 课表提取服务 - 业务能力层
//!
//! 只负责"从页面 HTML 中提取一周课表"能力，不做任何 I/O
//!
//! ## 提取流程
//! 1. 遍历所有 `<script>`，寻找 `createFullCalendar($.parseJSON('...'))` 调用
//! 2. 还原 `\"` 转义后按 JSON 数组解析；解析失败则尝试下一个 script
//! 3. 空数组 → Empty
//! 4. 没有可用数据 → 检查 `div#calendar` 容器，结果都是 Empty（原因不同）
//! 5. 逐个事件转换，单个事件出错只丢弃该事件
//! 6. 每天按开始时间排序
//!
//! 事件有两种形态：
//! - 完整时间戳：`start` / `end` 为 ISO 日期时间，星期由日期决定
//! - 星期代码：`strt_time` / `stop_time` 只有时刻，`Days_in_week` 如 `"MWF"`
//!
//! 先看 `start` 字段的形态（是否包含 `T`）决定走哪条路径。

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::debug;

use crate::models::schedule::{weekday_from_code, ScheduleEvent, WeekSchedule};

/// 日历初始化标记
const CALENDAR_MARKER: &str = "createFullCalendar";

/// 提取结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarState {
    /// 找到并解析了非空课表数据
    Scheduled,
    /// 页面没有课表
    Empty(EmptyReason),
}

/// 判定为 Empty 的具体分支
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// 数据存在但是空数组
    EmptyPayload,
    /// 日历容器里写着 "no classes"
    NoClassesNotice,
    /// 日历容器为空白
    BlankContainer,
    /// 既没有可解析的数据，容器也不能说明什么
    NoPayload,
}

/// 提取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub state: CalendarState,
    pub week: WeekSchedule,
}

impl Extraction {
    fn empty(reason: EmptyReason) -> Self {
        Self {
            state: CalendarState::Empty(reason),
            week: WeekSchedule::new(),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.state == CalendarState::Scheduled
    }
}

/// 单个事件的解析错误，只在本模块内部使用
#[derive(Debug, Error)]
enum EventError {
    #[error("事件不是 JSON 对象")]
    NotAnObject,
    #[error("缺少开始时间")]
    MissingStart,
    #[error("无法解析时间戳 '{0}'")]
    BadTimestamp(String),
    #[error("无法解析时刻 '{0}'")]
    BadTime(String),
}

/// 课表提取器
///
/// 职责：
/// - 持有预编译的正则和选择器
/// - 把一个页面转换成 `Extraction`
/// - 永不失败：所有异常输入都降级为 Empty 或丢弃单个事件
pub struct CalendarExtractor {
    payload_re: Regex,
    enrollment_re: Regex,
    script_selector: Selector,
    container_selector: Selector,
}

impl CalendarExtractor {
    /// 创建新的提取器
    pub fn new() -> Result<Self> {
        Ok(Self {
            payload_re: Regex::new(r"createFullCalendar\(\$\.parseJSON\('(.+?)'\)\)")?,
            enrollment_re: Regex::new(r"Enr:\s*(\d+)\s*of\s*(\d+)")?,
            script_selector: parse_selector("script")?,
            container_selector: parse_selector("div#calendar")?,
        })
    }

    /// 从 HTML 中提取一周课表
    pub fn extract(&self, html: &str) -> Extraction {
        let document = Html::parse_document(html);

        match self.find_payload(&document) {
            Some(events) if events.is_empty() => Extraction::empty(EmptyReason::EmptyPayload),
            Some(events) => Extraction {
                state: CalendarState::Scheduled,
                week: self.build_week(&events),
            },
            None => Extraction::empty(self.inspect_container(&document)),
        }
    }

    /// 找到第一个能解析成 JSON 数组的日历数据
    fn find_payload(&self, document: &Html) -> Option<Vec<JsonValue>> {
        for script in document.select(&self.script_selector) {
            let text: String = script.text().collect();
            if !text.contains(CALENDAR_MARKER) {
                continue;
            }

            let Some(caps) = self.payload_re.captures(&text) else {
                continue;
            };

            match parse_payload(&caps[1]) {
                Some(events) => return Some(events),
                None => debug!("日历数据解析失败，尝试下一个 script"),
            }
        }
        None
    }

    /// 没有数据时检查日历容器
    fn inspect_container(&self, document: &Html) -> EmptyReason {
        let Some(container) = document.select(&self.container_selector).next() else {
            return EmptyReason::NoPayload;
        };

        let text = container
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            EmptyReason::BlankContainer
        } else if text.to_lowercase().contains("no classes") {
            EmptyReason::NoClassesNotice
        } else {
            EmptyReason::NoPayload
        }
    }

    fn build_week(&self, events: &[JsonValue]) -> WeekSchedule {
        let mut week = WeekSchedule::new();

        for (index, raw) in events.iter().enumerate() {
            match self.parse_event(raw) {
                Ok(placed) => {
                    for (weekday, event) in placed {
                        week.push(weekday, event);
                    }
                }
                Err(e) => debug!("跳过第 {} 个事件: {}", index + 1, e),
            }
        }

        week.sort_by_start();
        week
    }

    /// 把一个原始事件转换成若干 (星期, 事件)
    ///
    /// 全部成功才返回，任何一步失败都不会留下部分结果
    fn parse_event(&self, raw: &JsonValue) -> Result<Vec<(Weekday, ScheduleEvent)>, EventError> {
        let obj = raw.as_object().ok_or(EventError::NotAnObject)?;
        let start = str_field(obj, "start");
        let end = str_field(obj, "end");

        // 完整时间戳
        if start.contains('T') {
            let start_dt = parse_timestamp(start)?;
            let end_time = if end.contains('T') {
                format_time(parse_timestamp(end)?.time())
            } else {
                String::new()
            };
            let event = self.build_event(obj, format_time(start_dt.time()), end_time);
            return Ok(vec![(start_dt.weekday(), event)]);
        }

        // 星期代码
        let strt_time = field_or(obj, "strt_time", start);
        let stop_time = field_or(obj, "stop_time", end);
        if strt_time.is_empty() {
            return Err(EventError::MissingStart);
        }

        let start_time = format_time(parse_time_of_day(strt_time)?);
        let end_time = if stop_time.is_empty() {
            String::new()
        } else {
            format_time(parse_time_of_day(stop_time)?)
        };

        let event = self.build_event(obj, start_time, end_time);
        Ok(str_field(obj, "Days_in_week")
            .trim()
            .chars()
            .filter_map(weekday_from_code)
            .map(|weekday| (weekday, event.clone()))
            .collect())
    }

    fn build_event(
        &self,
        obj: &Map<String, JsonValue>,
        start_time: String,
        end_time: String,
    ) -> ScheduleEvent {
        let (enrolled, capacity) = self.enrollment(obj);
        ScheduleEvent {
            course: str_field(obj, "title").trim().to_string(),
            session_type: str_field(obj, "lecture").trim().to_string(),
            start_time,
            end_time,
            enrolled,
            capacity,
        }
    }

    /// 先匹配 "Enr: X of Y"，否则回退到数值字段
    fn enrollment(&self, obj: &Map<String, JsonValue>) -> (Option<u32>, Option<u32>) {
        if let Some(caps) = self.enrollment_re.captures(str_field(obj, "enrollment")) {
            if let (Ok(enrolled), Ok(capacity)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
                return (Some(enrolled), Some(capacity));
            }
        }
        (
            count_field(obj, "enroll_total"),
            count_field(obj, "enroll_capacity"),
        )
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("无效的选择器 '{}': {}", css, e))
}

/// 还原转义后解析，只接受数组
fn parse_payload(raw: &str) -> Option<Vec<JsonValue>> {
    let json = raw.replace("\\\"", "\"");
    match serde_json::from_str::<JsonValue>(&json) {
        Ok(JsonValue::Array(events)) => Some(events),
        _ => None,
    }
}

/// 字符串字段，缺失或非字符串时为空
fn str_field<'a>(obj: &'a Map<String, JsonValue>, key: &str) -> &'a str {
    obj.get(key).and_then(JsonValue::as_str).unwrap_or("")
}

/// 字段缺失时使用 `fallback`；字段存在但不是字符串时为空
fn field_or<'a>(obj: &'a Map<String, JsonValue>, key: &str, fallback: &'a str) -> &'a str {
    match obj.get(key) {
        None => fallback,
        Some(value) => value.as_str().unwrap_or(""),
    }
}

/// 非负整数字段，接受数字或数字字符串
fn count_field(obj: &Map<String, JsonValue>, key: &str) -> Option<u32> {
    match obj.get(key)? {
        JsonValue::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// ISO 日期时间；带时区偏移时取该偏移下的本地时间
fn parse_timestamp(value: &str) -> Result<NaiveDateTime, EventError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| EventError::BadTimestamp(value.to_string()))
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, EventError> {
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value.trim(), fmt).ok())
        .ok_or_else(|| EventError::BadTime(value.to_string()))
}

fn format_time(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::WEEK_DAYS;

    fn extractor() -> CalendarExtractor {
        CalendarExtractor::new().unwrap()
    }

    /// 把数据包装成页面里的 `createFullCalendar` 调用，双引号按页面方式转义
    fn page_with_payload(payload: &str) -> String {
        let escaped = payload.replace('"', "\\\"");
        format!(
            "<html><head><script>var x = 1;</script></head><body>\
             <div id=\"classroomDetails\"></div><div id=\"calendar\"></div>\
             <script>$(function() {{ createFullCalendar($.parseJSON('{}')); }});</script>\
             </body></html>",
            escaped
        )
    }

    fn assert_sorted(week: &WeekSchedule) {
        for day in WEEK_DAYS {
            let times: Vec<_> = week.day(day).iter().map(|e| e.start_time.clone()).collect();
            let mut sorted = times.clone();
            sorted.sort();
            assert_eq!(times, sorted, "{day:?} 未按开始时间排序");
        }
    }

    #[test]
    fn test_empty_array_payload_is_empty() {
        let html = "<script>createFullCalendar($.parseJSON('[]'))</script>";
        let result = extractor().extract(html);

        assert_eq!(result.state, CalendarState::Empty(EmptyReason::EmptyPayload));
        assert!(result.week.is_empty());
    }

    #[test]
    fn test_weekday_code_event_expands_to_each_day() {
        let payload = r#"[{"title":"CS 101","lecture":"LEC","Days_in_week":"MW","strt_time":"10:00:00","stop_time":"11:15:00","enrollment":"Enr: 40 of 50"}]"#;
        let result = extractor().extract(&page_with_payload(payload));

        assert!(result.is_scheduled());
        let expected = ScheduleEvent {
            course: "CS 101".to_string(),
            session_type: "LEC".to_string(),
            start_time: "10:00 AM".to_string(),
            end_time: "11:15 AM".to_string(),
            enrolled: Some(40),
            capacity: Some(50),
        };
        assert_eq!(result.week.monday, vec![expected.clone()]);
        assert_eq!(result.week.wednesday, vec![expected]);
        assert_eq!(result.week.total_events(), 2);
    }

    #[test]
    fn test_no_script_and_blank_container_is_empty() {
        let html = r#"<html><body><div id="calendar">   </div></body></html>"#;
        let result = extractor().extract(html);

        assert_eq!(result.state, CalendarState::Empty(EmptyReason::BlankContainer));
        assert!(result.week.is_empty());
    }

    #[test]
    fn test_no_classes_notice_is_empty() {
        let html = r#"<div id="calendar"><p>There are <b>No Classes</b> scheduled</p></div>"#;
        let result = extractor().extract(html);
        assert_eq!(result.state, CalendarState::Empty(EmptyReason::NoClassesNotice));
    }

    #[test]
    fn test_missing_payload_with_other_content_is_still_empty() {
        let html = r#"<div id="calendar">Loading…</div>"#;
        assert_eq!(
            extractor().extract(html).state,
            CalendarState::Empty(EmptyReason::NoPayload)
        );
        assert_eq!(
            extractor().extract("<p>nothing here</p>").state,
            CalendarState::Empty(EmptyReason::NoPayload)
        );
    }

    #[test]
    fn test_unparseable_payload_falls_through_to_next_script() {
        let good = r#"[{"title":"MATH 31A","lecture":"DIS","Days_in_week":"F","strt_time":"09:00:00","stop_time":"09:50:00"}]"#;
        let html = format!(
            "<script>createFullCalendar($.parseJSON('[{{broken'))</script>{}",
            page_with_payload(good)
        );
        let result = extractor().extract(&html);

        assert!(result.is_scheduled());
        assert_eq!(result.week.friday.len(), 1);
        assert_eq!(result.week.friday[0].end_time, "09:50 AM");
    }

    #[test]
    fn test_only_unparseable_payloads_is_empty() {
        let html = "<script>createFullCalendar($.parseJSON('{oops'))</script>";
        assert_eq!(
            extractor().extract(html).state,
            CalendarState::Empty(EmptyReason::NoPayload)
        );
    }

    #[test]
    fn test_timestamp_event_uses_date_for_weekday() {
        // 2024-01-11 是星期四
        let payload = r#"[{"title":" PHYSICS 1B ","lecture":"LAB","start":"2024-01-11T14:00:00","end":"2024-01-11T15:50:00","enroll_total":18,"enroll_capacity":"24"}]"#;
        let result = extractor().extract(&page_with_payload(payload));

        assert!(result.is_scheduled());
        assert_eq!(result.week.total_events(), 1);
        let event = &result.week.thursday[0];
        assert_eq!(event.course, "PHYSICS 1B");
        assert_eq!(event.start_time, "02:00 PM");
        assert_eq!(event.end_time, "03:50 PM");
        assert_eq!(event.enrolled, Some(18));
        assert_eq!(event.capacity, Some(24));
    }

    #[test]
    fn test_timestamp_start_wins_over_day_codes() {
        // 2024-01-12 是星期五，星期代码只在没有时间戳时使用
        let payload = r#"[{"title":"CHEM 14A","lecture":"LEC","start":"2024-01-12T09:00:00","end":"2024-01-12T09:50:00","Days_in_week":"MWF","strt_time":"13:00:00","stop_time":"13:50:00"}]"#;
        let result = extractor().extract(&page_with_payload(payload));

        assert!(result.is_scheduled());
        assert_eq!(result.week.total_events(), 1);
        assert!(result.week.monday.is_empty());
        assert!(result.week.wednesday.is_empty());
        let event = &result.week.friday[0];
        assert_eq!(event.start_time, "09:00 AM");
        assert_eq!(event.end_time, "09:50 AM");
    }

    #[test]
    fn test_timestamp_with_offset_keeps_wall_clock_time() {
        let payload = r#"[{"title":"A","start":"2024-01-08T08:00:00-08:00"}]"#;
        let result = extractor().extract(&page_with_payload(payload));

        let event = &result.week.monday[0];
        assert_eq!(event.start_time, "08:00 AM");
        assert_eq!(event.end_time, "");
        assert_eq!(event.enrolled, None);
        assert_eq!(event.capacity, None);
    }

    #[test]
    fn test_bad_event_is_skipped_without_aborting_page() {
        let payload = r#"[
            {"title":"bad stamp","start":"2024-13-45T99:00:00"},
            {"title":"bad stop","Days_in_week":"T","strt_time":"10:00:00","stop_time":"late"},
            {"title":"no start","Days_in_week":"T"},
            "not an object",
            {"title":"good","Days_in_week":"T","strt_time":"13:00:00","stop_time":"14:00:00"}
        ]"#;
        let result = extractor().extract(&page_with_payload(&payload.replace('\n', "")));

        assert!(result.is_scheduled());
        assert_eq!(result.week.total_events(), 1);
        assert_eq!(result.week.tuesday[0].course, "good");
    }

    #[test]
    fn test_all_events_dropped_is_still_scheduled() {
        let payload = r#"[{"title":"no days","strt_time":"10:00:00"}]"#;
        let result = extractor().extract(&page_with_payload(payload));

        assert!(result.is_scheduled());
        assert!(result.week.is_empty());
    }

    #[test]
    fn test_unknown_day_codes_are_ignored() {
        let payload = r#"[{"title":"X","Days_in_week":" MXU ","strt_time":"18:00:00"}]"#;
        let result = extractor().extract(&page_with_payload(payload));

        assert_eq!(result.week.monday.len(), 1);
        assert_eq!(result.week.sunday.len(), 1);
        assert_eq!(result.week.total_events(), 2);
        assert_eq!(result.week.sunday[0].start_time, "06:00 PM");
    }

    #[test]
    fn test_time_only_start_falls_back_to_start_field() {
        let payload = r#"[{"title":"Y","Days_in_week":"W","start":"07:30:00","end":"08:20:00"}]"#;
        let result = extractor().extract(&page_with_payload(payload));

        assert_eq!(result.week.wednesday[0].start_time, "07:30 AM");
        assert_eq!(result.week.wednesday[0].end_time, "08:20 AM");
    }

    #[test]
    fn test_enrollment_text_wins_over_numeric_fields() {
        let payload = r#"[{"title":"Z","Days_in_week":"R","strt_time":"12:00:00","enrollment":"Enr:5 of  9","enroll_total":1,"enroll_capacity":2}]"#;
        let result = extractor().extract(&page_with_payload(payload));

        let event = &result.week.thursday[0];
        assert_eq!((event.enrolled, event.capacity), (Some(5), Some(9)));
    }

    #[test]
    fn test_events_are_sorted_per_day() {
        let payload = r#"[
            {"title":"late","Days_in_week":"MF","strt_time":"11:00:00"},
            {"title":"early","Days_in_week":"M","strt_time":"08:00:00"},
            {"title":"stamp","start":"2024-01-08T09:30:00"}
        ]"#;
        let result = extractor().extract(&page_with_payload(&payload.replace('\n', "")));

        let monday: Vec<_> = result.week.monday.iter().map(|e| e.course.as_str()).collect();
        assert_eq!(monday, vec!["early", "stamp", "late"]);
        assert_sorted(&result.week);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let payload = r#"[{"title":"CS 32","lecture":"LEC","Days_in_week":"TR","strt_time":"14:00:00","stop_time":"15:50:00"},{"title":"CS 33","start":"2024-01-12T08:00:00"}]"#;
        let html = page_with_payload(payload);
        let ex = extractor();

        let first = serde_json::to_string(&ex.extract(&html).week).unwrap();
        let second = serde_json::to_string(&ex.extract(&html).week).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_output_has_seven_days() {
        let ex = extractor();
        for html in [
            "",
            "<script>createFullCalendar($.parseJSON('[]'))</script>",
            "<div id=\"calendar\">no classes</div>",
        ] {
            let value = serde_json::to_value(ex.extract(html).week).unwrap();
            assert_eq!(value.as_object().unwrap().len(), 7);
        }
    }
}
