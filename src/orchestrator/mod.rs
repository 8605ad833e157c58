//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量抓取和结果调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量教室抓取处理器
//! - 管理应用生命周期（初始化、运行）
//! - 筛选待抓取教室（Vec<RoomRecord>）
//! - 控制并发数量（Semaphore）
//! - 合并结果、写检查点
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<RoomRecord>)
//!     ↓
//! workflow::RoomFlow (处理单个教室)
//!     ↓
//! services (能力层：calendar_extractor)
//!     ↓
//! infrastructure (基础设施：RenderGateway / JsExecutor)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一写者**：只有编排层修改记录集合和计数器
//! 2. **资源隔离**：每个任务独占一个渲染会话
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体解析

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{
    merge_outcome, plan_work, App, BatchProcessor, BatchReport, RunOptions, Summary,
};
