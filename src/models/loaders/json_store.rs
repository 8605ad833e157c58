//! 教室记录文件的读写
//!
//! 每次保存都完整重写整个文件：先写临时文件，再重命名覆盖，
//! 磁盘上任何时刻都是一份完整的快照。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult, FileError, InputError};
use crate::models::room::RoomRecord;

/// 记录存储
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 读取全部记录
    async fn load(&self) -> Result<Vec<RoomRecord>>;

    /// 用给定的记录集合完整覆盖存储
    async fn save(&self, records: &[RoomRecord]) -> Result<()>;
}

/// 基于单个 JSON 文件的记录存储
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<RoomRecord>> {
        let path = self.display_path();
        let bytes = fs::read(&self.path)
            .await
            .map_err(|e| AppError::file_read_failed(&path, e))?;

        let root: JsonValue =
            serde_json::from_slice(&bytes).map_err(|e| {
                AppError::File(FileError::JsonParseFailed {
                    path: path.clone(),
                    source: e,
                })
            })?;

        let records = parse_records(root, &path)?;
        debug!("从 {} 读取 {} 条记录", path, records.len());
        Ok(records)
    }

    async fn save(&self, records: &[RoomRecord]) -> Result<()> {
        let path = self.display_path();
        let data = to_pretty_json(&records).context("序列化教室记录失败")?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, &data)
            .await
            .map_err(|e| AppError::file_write_failed(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| AppError::file_write_failed(&path, e))?;

        debug!("已写入 {} 条记录到 {}", records.len(), path);
        Ok(())
    }
}

/// 校验顶层形状并逐条反序列化
pub fn parse_records(root: JsonValue, path: &str) -> AppResult<Vec<RoomRecord>> {
    let items = match root {
        JsonValue::Array(items) => items,
        _ => {
            return Err(InputError::NotAnArray {
                path: path.to_string(),
            }
            .into())
        }
    };

    if items.is_empty() {
        return Err(InputError::Empty {
            path: path.to_string(),
        }
        .into());
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| {
                AppError::Input(InputError::InvalidRecord {
                    path: path.to_string(),
                    index,
                    source,
                })
            })
        })
        .collect()
}

/// 4 空格缩进的 JSON
fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
