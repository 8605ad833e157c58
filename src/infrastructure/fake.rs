//! 测试用的渲染网关：按 URL 返回固定页面，可注入失败

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::config::ScrapeTimings;
use crate::infrastructure::{RenderGateway, RenderSession, WaitCondition};

#[derive(Debug, Clone)]
pub enum FakePage {
    Markup(String),
    NavigateFails,
    MarkupFails,
    /// 等待调用报错，但页面内容正常
    WaitFails(String),
    /// 导航时 panic，模拟会话崩溃
    Panics,
}

#[derive(Debug, Default)]
pub struct SessionStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
}

impl SessionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

pub struct FakeGateway {
    pages: Arc<HashMap<String, FakePage>>,
    stats: Arc<SessionStats>,
    latency: Duration,
    fail_open: bool,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            pages: Arc::new(HashMap::new()),
            stats: Arc::new(SessionStats::default()),
            latency: Duration::ZERO,
            fail_open: false,
        }
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), page);
        self
    }

    /// 每次导航耗时
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_sessions(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        self.stats.clone()
    }

    /// 不做任何等待的时间参数
    pub fn instant_timings() -> ScrapeTimings {
        ScrapeTimings {
            details_timeout: Duration::ZERO,
            settle_delay: Duration::ZERO,
            calendar_timeout: Duration::ZERO,
            ..ScrapeTimings::default()
        }
    }
}

#[async_trait]
impl RenderGateway for FakeGateway {
    type Session = FakeSession;

    async fn open_session(&self) -> Result<FakeSession> {
        if self.fail_open {
            bail!("浏览器启动失败");
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_live.fetch_max(live, Ordering::SeqCst);

        Ok(FakeSession {
            pages: self.pages.clone(),
            stats: self.stats.clone(),
            latency: self.latency,
            current: None,
        })
    }
}

pub struct FakeSession {
    pages: Arc<HashMap<String, FakePage>>,
    stats: Arc<SessionStats>,
    latency: Duration,
    current: Option<FakePage>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("未知页面: {}", url))?;
        match page {
            FakePage::NavigateFails => bail!("导航到 {} 失败", url),
            FakePage::Panics => panic!("会话崩溃: {}", url),
            other => {
                self.current = Some(other);
                Ok(())
            }
        }
    }

    async fn wait_for(&mut self, _condition: &WaitCondition, _timeout: Duration) -> Result<bool> {
        match &self.current {
            Some(FakePage::WaitFails(_)) => bail!("等待脚本执行失败"),
            _ => Ok(true),
        }
    }

    async fn current_markup(&mut self) -> Result<String> {
        match &self.current {
            Some(FakePage::Markup(html)) | Some(FakePage::WaitFails(html)) => Ok(html.clone()),
            _ => bail!("读取页面内容失败"),
        }
    }

    async fn close(self) -> Result<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
