//! 日志工具模块
//!
//! 提供日志初始化以及批量抓取各阶段的输出

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::Summary;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则详细模式为 debug，默认为 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 教室课表并发抓取");
    info!("📁 记录文件: {}", config.rooms_file.display());
    info!(
        "📊 并发数: {} | 检查点间隔: {}",
        config.max_concurrent_rooms,
        config.checkpoint_every()
    );
    info!("{}", "=".repeat(60));
}

/// 记录待抓取教室信息
///
/// # 参数
/// - `total_records`: 记录文件中的总条数
/// - `dispatched`: 本次要抓取的条数
pub fn log_rooms_loaded(total_records: usize, dispatched: usize, concurrency: usize, every: usize) {
    info!("✓ 共 {} 条记录，其中 {} 个教室待抓取", total_records, dispatched);
    info!("📋 并发数: {} | 每完成 {} 个保存一次", concurrency, every);
}

/// 记录检查点
pub fn log_checkpoint(completed: usize, total: usize, summary: &Summary) {
    info!(
        "💾 Saved: {}/{} | Scheduled: {} | No calendar: {} | Failed: {}",
        completed, total, summary.scheduled, summary.empty, summary.failed
    );
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &Summary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部抓取完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 处理总数: {}", summary.total);
    info!("✅ 有课表: {}", summary.scheduled);
    info!("➖ 无课表: {}", summary.empty);
    info!("❌ 失败: {}", summary.failed);
    info!("{}", "=".repeat(60));
}
