use std::future::Future;
use std::time::Duration;

use crate::core::error::{DownloadError, DownloadResult};

/// 有界重试策略：固定次数 + 指数退避（无抖动）
///
/// 与观测到的行为保持一致，所有错误一律重试，不区分瞬态/永久；
/// 如需按错误类型过滤，可在 `run` 的失败分支用
/// `DownloadError::is_retryable` 提前返回。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 总尝试次数（含第一次）
    pub max_attempts: usize,
    /// 第一次重试前的等待时间，之后逐次翻倍
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, initial_delay: Duration) -> Self {
        RetryPolicy { max_attempts, initial_delay }
    }

    /// 执行一个可重复调用的操作，直到成功或尝试次数耗尽。
    ///
    /// 成功立即返回；失败则等待当前退避时间后重试，等待时间翻倍。
    /// 最后一次失败后不再等待，返回携带尝试次数和最近一次失败原因的错误。
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> DownloadResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DownloadResult<T>>,
    {
        let mut delay = self.initial_delay;
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    log::warn!("第 {}/{} 次尝试失败: {}", attempt, self.max_attempts, e);
                    last_error = Some(e);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(DownloadError::RetriesExhausted {
            attempts: self.max_attempts,
            source: Box::new(
                last_error.unwrap_or_else(|| DownloadError::Unknown("操作未执行".to_string())),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result = policy
            .run(|| {
                let calls = Arc::clone(&calls2);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<u32, DownloadError>(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        // 失败2次后成功：应调用3次，退避 10ms + 20ms
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let started = Instant::now();

        let result = policy
            .run(|| {
                let calls = Arc::clone(&calls2);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(DownloadError::network("临时故障"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: Result<(), _> = policy
            .run(|| {
                let calls = Arc::clone(&calls2);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DownloadError::network("始终失败"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(DownloadError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(source.to_string().contains("始终失败"));
            }
            other => panic!("期望 RetriesExhausted, 实际: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(2));
    }
}
