use std::path::PathBuf;

use thiserror::Error;

/// 抓取流程错误类型
///
/// - `RemoteFetchFailed` 只中止当前条目（不写缓存，下次运行重试）
/// - `DownloadFailed` 只中止当前文件
/// - 存储相关错误对整个运行是致命的
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// 获取远程详情失败（导航、超时、页面结构异常）
    #[error("获取条目 {item_key} 的详情失败: {cause}")]
    RemoteFetchFailed { item_key: String, cause: String },

    /// 单个文件下载失败
    #[error("下载 {remote_url} 失败: {cause}")]
    DownloadFailed { remote_url: String, cause: String },

    /// 写入持久化存储失败
    #[error("写入 {} 失败: {source}", .path.display())]
    StorageWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 读取持久化存储失败
    #[error("读取 {} 失败: {source}", .path.display())]
    StorageReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 缓存文件无法解析
    #[error("缓存文件 {} 已损坏: {source}", .path.display())]
    CorruptCacheEntry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ScrapeError {
    /// 存储本身不可靠时，整个运行必须停止
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScrapeError::StorageWriteError { .. }
                | ScrapeError::StorageReadError { .. }
                | ScrapeError::CorruptCacheEntry { .. }
        )
    }

    pub fn remote_fetch_failed(item_key: impl Into<String>, cause: impl ToString) -> Self {
        ScrapeError::RemoteFetchFailed {
            item_key: item_key.into(),
            cause: cause.to_string(),
        }
    }

    pub fn download_failed(remote_url: impl Into<String>, cause: impl ToString) -> Self {
        ScrapeError::DownloadFailed {
            remote_url: remote_url.into(),
            cause: cause.to_string(),
        }
    }

    pub fn storage_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::StorageWriteError {
            path: path.into(),
            source,
        }
    }

    pub fn storage_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::StorageReadError {
            path: path.into(),
            source,
        }
    }
}

/// 抓取流程结果类型
pub type ScrapeResult<T> = Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(!ScrapeError::remote_fetch_failed("123", "超时").is_fatal());
        assert!(!ScrapeError::download_failed("https://x/a.pdf", "404").is_fatal());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(ScrapeError::storage_write("out/a.json", io).is_fatal());

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let corrupt = ScrapeError::CorruptCacheEntry {
            path: PathBuf::from("out/a.json"),
            source: parse,
        };
        assert!(corrupt.is_fatal());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ScrapeError::remote_fetch_failed("9876", "页面结构异常");
        let msg = err.to_string();
        assert!(msg.contains("9876"));
        assert!(msg.contains("页面结构异常"));
    }
}
