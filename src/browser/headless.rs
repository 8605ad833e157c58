use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::config::BrowserOptions;
use crate::error::BrowserError;
use crate::infrastructure::{JsExecutor, RenderGateway, RenderSession, WaitCondition};

/// 基于 chromiumoxide 的渲染网关
///
/// 每次 `open_session` 都启动一个独立的无头浏览器，
/// 一个卡死或崩溃的浏览器不会影响其他任务
#[derive(Clone, Debug)]
pub struct ChromiumGateway {
    options: BrowserOptions,
}

impl ChromiumGateway {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl RenderGateway for ChromiumGateway {
    type Session = ChromiumSession;

    async fn open_session(&self) -> Result<ChromiumSession> {
        launch_headless_browser(&self.options).await
    }
}

/// 一个浏览器实例 + 一个页面
///
/// 用户数据目录为会话独占，会话结束后删除
pub struct ChromiumSession {
    browser: Browser,
    executor: JsExecutor,
    _handler: HandlerGuard,
    _profile: TempDir,
}

/// 会话丢弃时停止事件循环
struct HandlerGuard(JoinHandle<()>);

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.executor
            .page()
            .goto(url)
            .await
            .map_err(|source| BrowserError::NavigationFailed {
                url: url.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn wait_for(&mut self, condition: &WaitCondition, timeout: Duration) -> Result<bool> {
        self.executor.poll_until(condition, timeout).await
    }

    async fn current_markup(&mut self) -> Result<String> {
        self.executor.content().await
    }

    async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        self.browser.wait().await?;
        debug!("浏览器已关闭");
        Ok(())
    }
}

/// 启动无头浏览器并打开空白页
pub async fn launch_headless_browser(options: &BrowserOptions) -> Result<ChromiumSession> {
    let profile = tempfile::Builder::new()
        .prefix("room-scraper-profile-")
        .tempdir()
        .map_err(|source| BrowserError::ProfileDirFailed { source })?;
    let config = build_browser_config(options, profile.path())?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        BrowserError::LaunchFailed { source: e }
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });
    let guard = HandlerGuard(handler_task);

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|source| BrowserError::PageCreationFailed { source })?;

    Ok(ChromiumSession {
        browser,
        executor: JsExecutor::new(page),
        _handler: guard,
        _profile: profile,
    })
}

fn build_browser_config(options: &BrowserOptions, profile_dir: &Path) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder().user_data_dir(profile_dir);
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    let (width, height) = options.window_size;
    builder = builder.window_size(width, height);

    if options.no_sandbox {
        builder = builder.no_sandbox();
    }
    if let Some(path) = &options.chrome_executable {
        builder = builder.chrome_executable(path);
    }

    let mut args = vec!["--disable-dev-shm-usage"]; // 防止共享内存不足
    if options.disable_gpu {
        args.push("--disable-gpu");
    }
    if options.suppress_logging {
        args.extend(["--disable-logging", "--log-level=3"]);
    }

    let config = builder.args(args).build().map_err(|message| {
        error!("配置无头浏览器失败: {}", message);
        BrowserError::ConfigurationFailed { message }
    })?;
    Ok(config)
}
