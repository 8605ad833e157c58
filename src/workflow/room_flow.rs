//! 教室抓取流程 - 流程层
//!
//! 核心职责：定义"一个教室"的完整抓取流程
//!
//! 流程顺序：
//! 1. 开启渲染会话 → 导航
//! 2. 等待页面主体（尽力而为）→ 固定停顿 → 等待日历事件（尽力而为）
//! 3. 读取 HTML → 课表提取
//! 4. 关闭会话（任何路径都会执行）

use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Config, ScrapeTimings};
use crate::infrastructure::{RenderGateway, RenderSession, WaitCondition};
use crate::models::schedule::WeekSchedule;
use crate::services::{CalendarExtractor, CalendarState, Extraction};
use crate::workflow::room_ctx::RoomCtx;

/// 单个教室的抓取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// 有课表
    Scheduled(WeekSchedule),
    /// 页面明确没有课表
    Empty,
    /// 抓取失败
    Failed,
}

impl ScrapeOutcome {
    /// 进度输出用的标签
    pub fn tag(&self) -> String {
        match self {
            ScrapeOutcome::Scheduled(week) => format!("OK ({} events)", week.total_events()),
            ScrapeOutcome::Empty => "NO_CALENDAR".to_string(),
            ScrapeOutcome::Failed => "FAILED".to_string(),
        }
    }
}

impl From<Extraction> for ScrapeOutcome {
    fn from(extraction: Extraction) -> Self {
        match extraction.state {
            CalendarState::Scheduled => ScrapeOutcome::Scheduled(extraction.week),
            CalendarState::Empty(_) => ScrapeOutcome::Empty,
        }
    }
}

/// 教室抓取流程
///
/// - 编排单个教室的抓取步骤
/// - 每次运行独占一个渲染会话，结束时释放
/// - 不修改任何共享状态，只返回结果
pub struct RoomFlow {
    extractor: CalendarExtractor,
    timings: ScrapeTimings,
}

impl RoomFlow {
    /// 创建新的抓取流程
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timings(config.timings.clone())
    }

    pub fn with_timings(timings: ScrapeTimings) -> Result<Self> {
        Ok(Self {
            extractor: CalendarExtractor::new()?,
            timings,
        })
    }

    /// 抓取一个教室，任何错误都折叠为 `Failed`
    pub async fn run<G: RenderGateway>(&self, gateway: &G, ctx: &RoomCtx) -> ScrapeOutcome {
        let outcome = match self.scrape(gateway, &ctx.url).await {
            Ok(extraction) => {
                if let CalendarState::Empty(reason) = extraction.state {
                    debug!("{} 判定为无课表: {:?}", ctx, reason);
                }
                ScrapeOutcome::from(extraction)
            }
            Err(e) => {
                warn!("{} ❌ 抓取出错: {:#}", ctx, e);
                ScrapeOutcome::Failed
            }
        };

        info!("{}: {}", ctx, outcome.tag());
        outcome
    }

    async fn scrape<G: RenderGateway>(&self, gateway: &G, url: &str) -> Result<Extraction> {
        let mut session = gateway.open_session().await?;

        let rendered = self.render(&mut session, url).await;

        if let Err(e) = session.close().await {
            warn!("释放渲染会话失败: {:#}", e);
        }

        let html = rendered?;
        Ok(self.extractor.extract(&html))
    }

    async fn render<S: RenderSession>(&self, session: &mut S, url: &str) -> Result<String> {
        session.navigate(url).await?;

        let details = WaitCondition::present(self.timings.details_selector.as_str());
        advisory_wait(session, &details, self.timings.details_timeout).await;

        if !self.timings.settle_delay.is_zero() {
            sleep(self.timings.settle_delay).await;
        }

        let events = WaitCondition::present(self.timings.calendar_selector.as_str());
        advisory_wait(session, &events, self.timings.calendar_timeout).await;

        session.current_markup().await
    }
}

/// 尽力而为的等待：超时或出错都只记录，不中断流程
async fn advisory_wait<S: RenderSession>(session: &mut S, condition: &WaitCondition, timeout: Duration) {
    match session.wait_for(condition, timeout).await {
        Ok(true) => {}
        Ok(false) => debug!("等待超时，继续: {}", condition.selector()),
        Err(e) => debug!("等待出错，继续: {} ({:#})", condition.selector(), e),
    }
}
