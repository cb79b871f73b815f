use thiserror::Error;
use std::io;

/// 下载过程中的错误分类
///
/// 三类基础错误（网络/文件系统/下载）分别对应请求阶段、
/// 本地文件操作阶段和流式拷贝阶段的失败，均保留底层原因。
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("网络错误: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("文件系统错误: {message}")]
    FileSystem {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("下载错误: {message}")]
    Download {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("重试 {attempts} 次后仍然失败: {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<DownloadError>,
    },

    #[error("{failed}/{total} 个任务下载失败")]
    PartialFailure { failed: usize, total: usize },

    #[error("全部 {total} 个任务下载失败: {first}")]
    AllFailed { total: usize, first: String },

    #[error("超过批次截止时间，任务被取消")]
    DeadlineExceeded,

    #[error("任务异常终止: {0}")]
    TaskPanicked(String),

    #[error("未知错误: {0}")]
    Unknown(String),
}

impl DownloadError {
    pub fn network(message: impl Into<String>) -> Self {
        DownloadError::Network { message: message.into(), source: None }
    }

    pub fn network_caused(message: impl Into<String>, source: reqwest::Error) -> Self {
        DownloadError::Network { message: message.into(), source: Some(source) }
    }

    pub fn filesystem(message: impl Into<String>, source: io::Error) -> Self {
        DownloadError::FileSystem { message: message.into(), source }
    }

    pub fn download(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DownloadError::Download { message: message.into(), source: Some(source.into()) }
    }

    /// 网络和下载错误视为瞬态，可以重试；
    /// 文件系统、URL等错误重试也不会成功。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DownloadError::Network { .. } | DownloadError::Download { .. }
        )
    }
}

pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(DownloadError::network("连接被重置").is_retryable());
        assert!(DownloadError::download(
            "写入中断",
            io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe")
        )
        .is_retryable());
    }

    #[test]
    fn test_error_not_retryable() {
        let fs_err = DownloadError::filesystem(
            "创建文件失败",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!fs_err.is_retryable());
        assert!(!DownloadError::InvalidUrl("notaurl".to_string()).is_retryable());
        assert!(!DownloadError::PartialFailure { failed: 2, total: 5 }.is_retryable());
        assert!(!DownloadError::DeadlineExceeded.is_retryable());
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let err = DownloadError::RetriesExhausted {
            attempts: 3,
            source: Box::new(DownloadError::network("连接超时")),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("3"));
    }
}
