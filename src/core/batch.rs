use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::config::Config;
use crate::core::downloader::Downloader;
use crate::core::error::DownloadError;
use crate::core::retry::RetryPolicy;
use crate::core::task::{BatchOutcome, DownloadTask, TaskResult};

/// 批量下载的调度器
///
/// 每个任务一个 tokio 任务，信号量作为并发闸门：任务先全部创建，
/// 超过 `max_workers` 的在闸门处等待，许可随 `_permit` 析构自动归还，
/// 即使任务异常退出也不会漏还。单个任务的 panic 由 `JoinError`
/// 兜住并降级为该任务的失败，不影响其余任务。
///
/// 整个批次共享一个从启动时刻起算的截止时间（`config.timeout`）：
/// 到点后尚未完成的任务（包括还在闸门处排队的）被取消并记为失败，
/// 客户端自身的请求超时只作为单次尝试的传输兜底。
pub struct BatchDownloader {
    downloader: Arc<Downloader>,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
    resume: bool,
    deadline: Duration,
}

impl BatchDownloader {
    pub fn new(config: Arc<Config>) -> Self {
        BatchDownloader {
            permits: Arc::new(Semaphore::new(config.max_concurrent_downloads)),
            retry: RetryPolicy::new(
                config.retry_count,
                Duration::from_secs(config.retry_delay),
            ),
            resume: config.enable_resume,
            deadline: Duration::from_secs(config.timeout),
            downloader: Arc::new(Downloader::new(config)),
        }
    }

    /// 覆盖并发上限（主要供测试使用）
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(workers));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 覆盖批次截止时间
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// 并发执行全部任务，等待每个任务产出结果后返回。
    ///
    /// 不会因为某个任务失败而取消其它任务；唯一的取消手段是
    /// 批次截止时间，到点后未完成的任务以 `DeadlineExceeded` 收尾。
    pub async fn download_all(&self, tasks: Vec<DownloadTask>) -> BatchOutcome {
        let deadline = Instant::now() + self.deadline;
        let mut handles = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.into_iter().enumerate() {
            let downloader = Arc::clone(&self.downloader);
            let permits = Arc::clone(&self.permits);
            let retry = self.retry.clone();
            let resume = self.resume;

            let handle = tokio::spawn(async move {
                // 排队等许可的时间也计入截止时间
                let unit = async {
                    let _permit = permits.acquire_owned().await.map_err(|e| {
                        DownloadError::Unknown(format!("并发闸门已关闭: {}", e))
                    })?;

                    retry
                        .run(|| async {
                            if resume {
                                downloader.download_resumable(&task).await
                            } else {
                                downloader.download(&task).await
                            }
                        })
                        .await
                };

                match tokio::time::timeout_at(deadline, unit).await {
                    Ok(Ok(bytes)) => TaskResult::completed(index, task.filename.clone(), bytes),
                    Ok(Err(e)) => {
                        log::error!("任务 {} ({}) 下载失败: {}", index, task.filename, e);
                        TaskResult::failed(index, task.filename.clone(), e)
                    }
                    Err(_) => {
                        log::error!("任务 {} ({}) 超过批次截止时间，已取消", index, task.filename);
                        TaskResult::failed(
                            index,
                            task.filename.clone(),
                            DownloadError::DeadlineExceeded,
                        )
                    }
                }
            });

            handles.push((index, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                // 任务 panic 不能拖垮整个批次，降级为单个任务失败
                Err(e) => results.push(TaskResult::failed(
                    index,
                    String::new(),
                    DownloadError::TaskPanicked(e.to_string()),
                )),
            }
        }

        BatchOutcome { results }
    }
}
