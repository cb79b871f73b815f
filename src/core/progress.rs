use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::Stream;

/// 进度通知的最小间隔，避免回调过于频繁刷新UI
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// 一次进度快照。total 为 0 表示总大小未知。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// 已下载字节数（含续传起点之前的部分）
    pub downloaded: u64,
    /// 预期总字节数，0 表示未知
    pub total: u64,
    /// 自上次采样以来的瞬时速度（字节/秒）
    pub speed: f64,
}

pub type ProgressCallback = Arc<dyn Fn(ProgressSample) + Send + Sync>;

/// 字节流的进度装饰器
///
/// 包装响应体的分块流，透传数据的同时累加原子计数器，
/// 每隔 `UPDATE_INTERVAL` 以上才触发一次回调。
/// 最后一块数据如果落在间隔之内不会触发回调，
/// 需要 100% 终态的调用方应在拷贝结束后自行补发。
pub struct ProgressStream<S> {
    inner: S,
    total: u64,
    downloaded: Arc<AtomicU64>,
    callback: ProgressCallback,
    last_update: Instant,
    last_downloaded: u64,
}

impl<S> ProgressStream<S> {
    pub fn new(inner: S, total: u64, callback: ProgressCallback) -> Self {
        ProgressStream {
            inner,
            total,
            downloaded: Arc::new(AtomicU64::new(0)),
            callback,
            last_update: Instant::now(),
            last_downloaded: 0,
        }
    }

    /// 预置续传起点，使百分比和速度按整个文件计算。
    /// 必须在开始消费流之前调用。
    pub fn with_offset(self, offset: u64) -> Self {
        self.downloaded.store(offset, Ordering::SeqCst);
        ProgressStream { last_downloaded: offset, ..self }
    }

    /// 共享的字节计数器，可在流被消费的同时读取
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.downloaded)
    }
}

impl<S, E> Stream for ProgressStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.get_mut();
        match Pin::new(&mut me.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                me.downloaded.fetch_add(chunk.len() as u64, Ordering::SeqCst);

                let now = Instant::now();
                let elapsed = now.duration_since(me.last_update);
                if elapsed >= UPDATE_INTERVAL {
                    let downloaded = me.downloaded.load(Ordering::SeqCst);
                    let speed =
                        (downloaded - me.last_downloaded) as f64 / elapsed.as_secs_f64();
                    (me.callback)(ProgressSample { downloaded, total: me.total, speed });
                    me.last_update = now;
                    me.last_downloaded = downloaded;
                }

                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::Mutex;

    type TestItem = Result<Bytes, std::io::Error>;

    fn chunks(sizes: &[usize]) -> Vec<TestItem> {
        sizes.iter().map(|n| Ok(Bytes::from(vec![0u8; *n]))).collect()
    }

    #[tokio::test]
    async fn test_counter_accumulates() {
        let stream = futures::stream::iter(chunks(&[100, 200, 50]));
        let progress = ProgressStream::new(stream, 350, Arc::new(|_| {}));
        let counter = progress.counter();

        let collected: Vec<_> = progress.collect().await;
        assert_eq!(collected.len(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 350);
    }

    #[tokio::test]
    async fn test_offset_seeds_counter() {
        let stream = futures::stream::iter(chunks(&[100]));
        let progress =
            ProgressStream::new(stream, 600, Arc::new(|_| {})).with_offset(500);
        let counter = progress.counter();
        // 流还未消费时计数器已经反映续传起点
        assert_eq!(counter.load(Ordering::SeqCst), 500);

        let _: Vec<_> = progress.collect().await;
        assert_eq!(counter.load(Ordering::SeqCst), 600);
    }

    #[tokio::test]
    async fn test_no_callback_within_interval() {
        // 数据瞬间到齐，距创建不足100ms，不应有任何回调
        let calls = Arc::new(AtomicU64::new(0));
        let calls2 = Arc::clone(&calls);
        let stream = futures::stream::iter(chunks(&[10, 10, 10]));
        let progress = ProgressStream::new(
            stream,
            30,
            Arc::new(move |_| {
                calls2.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let _: Vec<_> = progress.collect().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_callback_after_interval() {
        let samples: Arc<Mutex<Vec<ProgressSample>>> = Arc::new(Mutex::new(Vec::new()));
        let samples2 = Arc::clone(&samples);

        // 两块数据之间留出超过节流间隔的时间
        let stream = futures::stream::unfold(0u32, |n| async move {
            match n {
                0 => Some((Ok(Bytes::from(vec![0u8; 100])) as TestItem, 1)),
                1 => {
                    tokio::time::sleep(Duration::from_millis(120)).await;
                    Some((Ok(Bytes::from(vec![0u8; 100])) as TestItem, 2))
                }
                _ => None,
            }
        })
        .boxed();

        let progress = ProgressStream::new(
            stream,
            200,
            Arc::new(move |s| {
                samples2.lock().unwrap().push(s);
            }),
        );
        let _: Vec<_> = progress.collect().await;

        let samples = samples.lock().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].downloaded, 200);
        assert_eq!(samples[0].total, 200);
        assert!(samples[0].speed > 0.0);
    }
}
