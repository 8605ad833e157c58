use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 教室记录文件
    pub rooms_file: PathBuf,
    /// 最多抓取多少个教室（None 表示全部）
    pub limit: Option<usize>,
    /// 同时抓取的教室数量
    pub max_concurrent_rooms: usize,
    /// 每完成多少个教室写一次检查点（None 表示与并发数相同）
    pub checkpoint_every: Option<usize>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 浏览器参数
    pub browser: BrowserOptions,
    /// 页面等待参数
    pub timings: ScrapeTimings,
}

/// 无头浏览器参数，只影响渲染，不影响提取语义
#[derive(Clone, Debug)]
pub struct BrowserOptions {
    pub headless: bool,
    pub disable_gpu: bool,
    pub window_size: (u32, u32),
    /// 关闭浏览器自身的日志输出
    pub suppress_logging: bool,
    pub no_sandbox: bool,
    pub chrome_executable: Option<PathBuf>,
}

/// 单个教室页面的等待策略，所有等待都是尽力而为
#[derive(Clone, Debug)]
pub struct ScrapeTimings {
    /// 页面主体标记
    pub details_selector: String,
    pub details_timeout: Duration,
    /// 第一次等待之后固定停顿
    pub settle_delay: Duration,
    /// 日历事件元素
    pub calendar_selector: String,
    pub calendar_timeout: Duration,
}

pub const DEFAULT_CONCURRENCY: usize = 4;

impl Default for Config {
    fn default() -> Self {
        Self {
            rooms_file: PathBuf::from("classrooms.json"),
            limit: None,
            max_concurrent_rooms: DEFAULT_CONCURRENCY,
            checkpoint_every: None,
            verbose_logging: false,
            browser: BrowserOptions::default(),
            timings: ScrapeTimings::default(),
        }
    }
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            disable_gpu: true,
            window_size: (1920, 1080),
            suppress_logging: true,
            no_sandbox: true,
            chrome_executable: None,
        }
    }
}

impl Default for ScrapeTimings {
    fn default() -> Self {
        Self {
            details_selector: "#classroomDetails".to_string(),
            details_timeout: Duration::from_secs(6),
            settle_delay: Duration::from_secs(2),
            calendar_selector: ".fc-event, [class*='fc-event']".to_string(),
            calendar_timeout: Duration::from_secs(4),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            rooms_file: std::env::var("ROOMS_FILE").map(PathBuf::from).unwrap_or(default.rooms_file),
            limit: default.limit,
            max_concurrent_rooms: std::env::var("MAX_CONCURRENT_ROOMS").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.max_concurrent_rooms),
            checkpoint_every: std::env::var("CHECKPOINT_EVERY").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            browser: BrowserOptions {
                headless: std::env::var("BROWSER_HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser.headless),
                chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
                ..default.browser
            },
            timings: default.timings,
        }
    }

    /// 应用位置参数：`[limit] [concurrency] [checkpoint_every]`
    ///
    /// 无法解析的值不会中断运行，回退到默认值并返回警告
    pub fn apply_args<I, S>(&mut self, args: I) -> Vec<ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut warnings = Vec::new();
        let mut args = args.into_iter();

        if let Some(raw) = args.next() {
            match raw.as_ref().trim().parse::<i64>() {
                Ok(n) if n > 0 => self.limit = Some(n as usize),
                Ok(_) => self.limit = None,
                Err(_) => {
                    self.limit = None;
                    warnings.push(arg_error("limit", raw.as_ref(), "无限制"));
                }
            }
        }

        if let Some(raw) = args.next() {
            match parse_positive(raw.as_ref()) {
                Some(n) => self.max_concurrent_rooms = n,
                None => {
                    self.max_concurrent_rooms = DEFAULT_CONCURRENCY;
                    warnings.push(arg_error(
                        "concurrency",
                        raw.as_ref(),
                        &DEFAULT_CONCURRENCY.to_string(),
                    ));
                }
            }
        }

        if let Some(raw) = args.next() {
            match parse_positive(raw.as_ref()) {
                Some(n) => self.checkpoint_every = Some(n),
                None => {
                    self.checkpoint_every = None;
                    warnings.push(arg_error("checkpoint_every", raw.as_ref(), "与并发数相同"));
                }
            }
        }

        warnings
    }

    /// 实际使用的检查点间隔
    pub fn checkpoint_every(&self) -> usize {
        self.checkpoint_every.unwrap_or(self.max_concurrent_rooms).max(1)
    }
}

fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn arg_error(name: &str, value: &str, fallback: &str) -> ConfigError {
    ConfigError::ArgParseFailed {
        name: name.to_string(),
        value: value.to_string(),
        expected_type: "整数".to_string(),
        fallback: fallback.to_string(),
    }
}
