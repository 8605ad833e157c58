//! 教室抓取上下文
//!
//! 封装"我正在抓第几个教室、它在记录文件里的哪个位置"这一信息

use std::fmt::Display;

use crate::models::room::RoomRecord;

/// 教室抓取上下文
///
/// 包含抓取单个教室所需的所有上下文信息
#[derive(Debug, Clone)]
pub struct RoomCtx {
    /// 在完整记录集合中的位置，合并结果时使用
    pub position: usize,

    /// 本次运行中的序号（从1开始，仅用于日志显示）
    pub ordinal: usize,

    /// 本次运行要抓取的总数
    pub total: usize,

    /// 位置标签（楼 + 房间号）
    pub label: String,

    /// 详情页地址
    pub url: String,
}

impl RoomCtx {
    /// 创建新的抓取上下文
    pub fn new(position: usize, ordinal: usize, total: usize, record: &RoomRecord) -> Self {
        Self {
            position,
            ordinal,
            total,
            label: record.label(),
            url: record.url().to_string(),
        }
    }
}

impl Display for RoomCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}] {}", self.ordinal, self.total, self.label)
    }
}
