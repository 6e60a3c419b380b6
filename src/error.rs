use std::path::PathBuf;

use thiserror::Error;

/// 库内错误类型。管线层统一转换为 `anyhow::Error` 并附加上下文。
#[derive(Error, Debug)]
pub enum IsomirError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
    /// 输入本身不合法：长度不一致、缺失属性、坐标越界等
    #[error("invalid input for '{key}': {reason}")]
    InvalidInput { key: String, reason: String },
    /// tag 放不进扩展前体窗口；绝不截断
    #[error(
        "tag '{tag}' of '{mirna}' overflows the precursor window: start {start} + tag length {tag_len} vs window length {window_len}"
    )]
    WindowOverflow {
        mirna: String,
        tag: String,
        start: i64,
        tag_len: usize,
        window_len: usize,
    },
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

impl IsomirError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput { key: key.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, IsomirError>;
