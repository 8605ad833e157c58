//! 课表数据模型
//!
//! `WeekSchedule` 固定包含周一到周日七个键，序列化时按星期顺序输出

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// 单次上课事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    /// 课程名称
    pub course: String,
    /// 课程类型（LEC / DIS / LAB ...）
    #[serde(rename = "type")]
    pub session_type: String,
    /// 开始时间，格式 `%I:%M %p`
    pub start_time: String,
    /// 结束时间，未知时为空字符串
    pub end_time: String,
    /// 已选人数
    pub enrolled: Option<u32>,
    /// 容量
    pub capacity: Option<u32>,
}

/// 一周课表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSchedule {
    #[serde(rename = "Monday", default)]
    pub monday: Vec<ScheduleEvent>,
    #[serde(rename = "Tuesday", default)]
    pub tuesday: Vec<ScheduleEvent>,
    #[serde(rename = "Wednesday", default)]
    pub wednesday: Vec<ScheduleEvent>,
    #[serde(rename = "Thursday", default)]
    pub thursday: Vec<ScheduleEvent>,
    #[serde(rename = "Friday", default)]
    pub friday: Vec<ScheduleEvent>,
    #[serde(rename = "Saturday", default)]
    pub saturday: Vec<ScheduleEvent>,
    #[serde(rename = "Sunday", default)]
    pub sunday: Vec<ScheduleEvent>,
}

/// 按周一到周日的顺序排列
pub const WEEK_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl WeekSchedule {
    /// 创建空课表（七天均为空列表）
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day(&self, weekday: Weekday) -> &[ScheduleEvent] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut Vec<ScheduleEvent> {
        match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }

    /// 添加事件到指定星期
    pub fn push(&mut self, weekday: Weekday, event: ScheduleEvent) {
        self.day_mut(weekday).push(event);
    }

    /// 每天按开始时间字符串稳定排序
    pub fn sort_by_start(&mut self) {
        for weekday in WEEK_DAYS {
            self.day_mut(weekday)
                .sort_by(|a, b| a.start_time.cmp(&b.start_time));
        }
    }

    /// 全周事件总数
    pub fn total_events(&self) -> usize {
        WEEK_DAYS.iter().map(|d| self.day(*d).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_events() == 0
    }
}

/// 星期代码 → 星期（M T W R F S U）
pub fn weekday_from_code(code: char) -> Option<Weekday> {
    match code {
        'M' => Some(Weekday::Mon),
        'T' => Some(Weekday::Tue),
        'W' => Some(Weekday::Wed),
        'R' => Some(Weekday::Thu),
        'F' => Some(Weekday::Fri),
        'S' => Some(Weekday::Sat),
        'U' => Some(Weekday::Sun),
        _ => None,
    }
}
