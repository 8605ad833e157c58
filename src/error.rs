use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error(transparent)]
    Browser(#[from] BrowserError),
    /// 文件操作错误
    #[error(transparent)]
    File(#[from] FileError),
    /// 输入数据形状错误（致命，发生在任何调度之前）
    #[error(transparent)]
    Input(#[from] InputError),
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {message}")]
    ConfigurationFailed { message: String },
    /// 创建独立的用户数据目录失败
    #[error("创建浏览器用户数据目录失败")]
    ProfileDirFailed {
        #[source]
        source: std::io::Error,
    },
    /// 启动浏览器失败
    #[error("启动浏览器失败")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 创建页面失败
    #[error("创建页面失败")]
    PageCreationFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 导航失败
    #[error("导航到 {url} 失败")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 执行脚本失败
    #[error("执行脚本失败")]
    ScriptExecutionFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 读取页面内容失败
    #[error("读取页面内容失败")]
    ContentFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path})")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path})")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path})")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 记录文件形状错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 顶层不是数组
    #[error("{path} 的顶层必须是数组")]
    NotAnArray { path: String },
    /// 数组为空
    #[error("{path} 中没有任何教室记录")]
    Empty { path: String },
    /// 某个元素不是合法的教室记录
    #[error("{path} 第 {index} 条记录无效")]
    InvalidRecord {
        path: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 参数解析失败（非致命，调用方回退到默认值）
    #[error("参数 {name} 解析失败: 值 '{value}' 无法转换为 {expected_type}，使用默认值 {fallback}")]
    ArgParseFailed {
        name: String,
        value: String,
        expected_type: String,
        fallback: String,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
