//! 批量教室抓取处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量抓取的调度和结果持久化。
//!
//! ## 核心功能
//!
//! 1. **筛选**：只抓取 `offered = true` 的教室，可按数量截断
//! 2. **并发控制**：使用 Semaphore 限制同时存在的渲染会话数量
//! 3. **结果合并**：按完成顺序逐个合并到原始位置，只有本模块写记录集合
//! 4. **检查点**：每完成 N 个教室完整重写一次记录文件，结束时再写一次
//! 5. **全局统计**：汇总 scheduled / empty / failed
//!
//! ## 设计特点
//!
//! - **消息传递**：每个任务只返回自己的结果，不触碰共享状态
//! - **不丢结果**：任务 panic 也会记为 Failed
//! - **向下委托**：单个教室的抓取交给 `workflow::RoomFlow`

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::error;

use crate::browser::ChromiumGateway;
use crate::config::Config;
use crate::infrastructure::RenderGateway;
use crate::models::loaders::{JsonFileStore, RecordStore};
use crate::models::room::RoomRecord;
use crate::utils::logging::{
    log_checkpoint, log_rooms_loaded, log_startup, print_final_stats,
};
use crate::workflow::{RoomCtx, RoomFlow, ScrapeOutcome};

/// 一次运行的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// 最多抓取的教室数量
    pub limit: Option<usize>,
    /// 并发数
    pub concurrency: usize,
    /// 每完成多少个写一次检查点
    pub checkpoint_every: usize,
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            limit: config.limit,
            concurrency: config.max_concurrent_rooms,
            checkpoint_every: config.checkpoint_every(),
        }
    }
}

/// 抓取统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub scheduled: usize,
    pub empty: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &ScrapeOutcome) {
        match outcome {
            ScrapeOutcome::Scheduled(_) => self.scheduled += 1,
            ScrapeOutcome::Empty => self.empty += 1,
            ScrapeOutcome::Failed => self.failed += 1,
        }
    }

    pub fn completed(&self) -> usize {
        self.scheduled + self.empty + self.failed
    }
}

/// 运行结束后的记录集合与统计
#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<RoomRecord>,
    pub summary: Summary,
}

/// 批量处理器
///
/// 持有渲染网关、记录存储和单教室流程；渲染网关和流程在任务之间共享，
/// 渲染会话不共享
pub struct BatchProcessor<G, S> {
    gateway: Arc<G>,
    store: S,
    flow: Arc<RoomFlow>,
}

impl<G: RenderGateway, S: RecordStore> BatchProcessor<G, S> {
    pub fn new(gateway: G, store: S, flow: RoomFlow) -> Self {
        Self {
            gateway: Arc::new(gateway),
            store,
            flow: Arc::new(flow),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 抓取所有待抓取教室，返回合并后的完整记录集合
    pub async fn run(&self, mut records: Vec<RoomRecord>, options: &RunOptions) -> Result<BatchReport> {
        let work = plan_work(&records, options.limit);
        let total = work.len();
        let concurrency = options.concurrency.max(1);
        let every = options.checkpoint_every.max(1);

        log_rooms_loaded(records.len(), total, concurrency, every);

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut pending = FuturesUnordered::new();

        for ctx in work {
            let position = ctx.position;
            let ordinal = ctx.ordinal;
            let semaphore = semaphore.clone();
            let gateway = self.gateway.clone();
            let flow = self.flow.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                Ok::<_, anyhow::Error>(flow.run(gateway.as_ref(), &ctx).await)
            });
            pending.push(handle.map(move |joined| (position, ordinal, joined)));
        }

        let mut summary = Summary {
            total,
            ..Default::default()
        };

        // 逐个合并，合并与检查点都在这里串行执行
        while let Some((position, ordinal, joined)) = pending.next().await {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    error!("[{}/{}] 任务未能开始: {:#}", ordinal, total, e);
                    ScrapeOutcome::Failed
                }
                Err(e) => {
                    error!("[{}/{}] 任务执行失败: {}", ordinal, total, e);
                    ScrapeOutcome::Failed
                }
            };

            summary.record(&outcome);
            merge_outcome(&mut records[position], outcome)
                .with_context(|| format!("[{}/{}] 合并抓取结果失败", ordinal, total))?;

            let completed = summary.completed();
            if completed % every == 0 && completed < total {
                self.checkpoint(&records, completed, &summary).await?;
            }
        }

        self.checkpoint(&records, summary.completed(), &summary).await?;

        Ok(BatchReport { records, summary })
    }

    async fn checkpoint(&self, records: &[RoomRecord], completed: usize, summary: &Summary) -> Result<()> {
        self.store
            .save(records)
            .await
            .with_context(|| format!("写入检查点失败 ({}/{})", completed, summary.total))?;
        log_checkpoint(completed, summary.total, summary);
        Ok(())
    }
}

/// 待抓取列表：按原始顺序筛选 `offered`，再按 limit 截断
pub fn plan_work(records: &[RoomRecord], limit: Option<usize>) -> Vec<RoomCtx> {
    let mut positions: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.is_offered())
        .map(|(position, _)| position)
        .collect();

    if let Some(limit) = limit.filter(|n| *n > 0) {
        positions.truncate(limit);
    }

    let total = positions.len();
    positions
        .into_iter()
        .enumerate()
        .map(|(idx, position)| RoomCtx::new(position, idx + 1, total, &records[position]))
        .collect()
}

/// 把结果整体写入记录
pub fn merge_outcome(record: &mut RoomRecord, outcome: ScrapeOutcome) -> Result<()> {
    match outcome {
        ScrapeOutcome::Scheduled(week) => record.mark_scheduled(&week)?,
        ScrapeOutcome::Empty => record.mark_empty(),
        ScrapeOutcome::Failed => record.mark_unresolved(),
    }
    Ok(())
}

/// 应用主结构
pub struct App {
    config: Config,
    processor: BatchProcessor<ChromiumGateway, JsonFileStore>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let flow = RoomFlow::new(&config)?;
        let gateway = ChromiumGateway::new(config.browser.clone());
        let store = JsonFileStore::new(&config.rooms_file);

        Ok(Self {
            config,
            processor: BatchProcessor::new(gateway, store, flow),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<Summary> {
        // 形状错误在这里直接返回，不会调度任何任务
        let records = self.processor.store().load().await?;

        let options = RunOptions::from(&self.config);
        let report = self.processor.run(records, &options).await?;

        print_final_stats(&report.summary);

        Ok(report.summary)
    }
}
