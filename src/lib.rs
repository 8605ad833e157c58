//! # Room Schedule Scraper
//!
//! 把教室详情页转换成结构化的一周课表，并以有界并发批量抓取整份教室列表，
//! 过程中定期把完整记录写回文件，中断后已完成的工作不会丢失。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 渲染网关能力接口（open / navigate / wait / markup / close）
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `browser/` - 基于 chromiumoxide 的无头浏览器实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个页面
//! - `CalendarExtractor` - 从 HTML 提取一周课表（纯函数，不做 I/O）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个教室"的完整抓取流程
//! - `RoomCtx` - 上下文封装（位置 + 序号 + 标签）
//! - `RoomFlow` - 流程编排（navigate → wait → markup → extract）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 并发调度、结果合并、检查点
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::ChromiumGateway;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, RenderGateway, RenderSession, WaitCondition};
pub use models::{JsonFileStore, RecordStore, RoomRecord, ScheduleEvent, ScheduleState, WeekSchedule};
pub use orchestrator::{App, BatchProcessor, RunOptions, Summary};
pub use services::{CalendarExtractor, CalendarState, EmptyReason, Extraction};
pub use workflow::{RoomCtx, RoomFlow, ScrapeOutcome};
