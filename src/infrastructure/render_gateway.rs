//! 渲染网关 - 基础设施层
//!
//! 把"给一个 URL，得到执行完脚本后的 HTML"抽象成能力接口，
//! 上层流程只依赖这里的 trait，测试时可以换成返回固定页面的实现。

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// 等待条件：至少有一个元素匹配选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitCondition {
    selector: String,
}

impl WaitCondition {
    pub fn present(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// 给定当前匹配数量，条件是否已满足
    pub fn is_met(&self, count: usize) -> bool {
        count > 0
    }
}

/// 渲染网关：负责开启会话
#[async_trait]
pub trait RenderGateway: Send + Sync + 'static {
    type Session: RenderSession;

    /// 开启一个新的渲染会话；会话不会在任务之间共享
    async fn open_session(&self) -> Result<Self::Session>;
}

/// 渲染会话：一个任务独占一个
#[async_trait]
pub trait RenderSession: Send {
    /// 导航到指定 URL
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// 等待条件满足；超时返回 `Ok(false)`，不是错误
    async fn wait_for(&mut self, condition: &WaitCondition, timeout: Duration) -> Result<bool>;

    /// 当前渲染后的完整 HTML
    async fn current_markup(&mut self) -> Result<String>;

    /// 释放会话
    async fn close(self) -> Result<()>;
}
