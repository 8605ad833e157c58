//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"和"读页面"的能力

use std::time::Duration;

use anyhow::Result;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::BrowserError;
use crate::infrastructure::render_gateway::WaitCondition;

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识教室 / 课表
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|source| BrowserError::ScriptExecutionFailed { source })?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 统计匹配选择器的元素数量
    pub async fn count_matching(&self, selector: &str) -> Result<usize> {
        let js_code = format!(
            "document.querySelectorAll({}).length",
            serde_json::to_string(selector)?
        );
        self.eval_as(js_code).await
    }

    /// 轮询直到条件满足或超时
    ///
    /// # 返回
    /// 条件满足返回 `true`，超时返回 `false`
    pub async fn poll_until(&self, condition: &WaitCondition, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let count = self.count_matching(condition.selector()).await?;
            if condition.is_met(count) {
                debug!("等待条件已满足: {:?} ({} 个元素)", condition, count);
                return Ok(true);
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 读取当前页面 HTML
    pub async fn content(&self) -> Result<String> {
        let html = self
            .page
            .content()
            .await
            .map_err(|source| BrowserError::ContentFailed { source })?;
        Ok(html)
    }
}
