//! Core: 下载执行、断点续传、重试、批量调度与进度装饰器

pub mod batch;
pub mod downloader;
pub mod error;
pub mod progress;
pub mod retry;
pub mod task;

// 只导出主流程和其它模块实际用到的类型
pub use batch::BatchDownloader;
pub use downloader::Downloader;
pub use error::{DownloadError, DownloadResult};
pub use progress::{ProgressCallback, ProgressSample, ProgressStream};
pub use retry::RetryPolicy;
pub use task::{BatchOutcome, DownloadTask, TaskResult};
