use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::core::error::{DownloadError, DownloadResult};
use crate::core::progress::{ProgressCallback, ProgressStream};
use crate::core::task::DownloadTask;
use crate::ui;

type ByteStream = BoxStream<'static, reqwest::Result<Bytes>>;

/// 单次下载的执行器
///
/// 每个方法只执行一次尝试，重试由 `RetryPolicy` 在外层包裹。
/// 非断点下载失败时删除残缺文件；断点下载失败时保留，
/// 以便下一次尝试从断点继续。
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(config: Arc<Config>) -> Self {
        Downloader {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout))
                .user_agent(&config.user_agent)
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// 完整下载一次，返回写入的字节数
    pub async fn download(&self, task: &DownloadTask) -> DownloadResult<u64> {
        if task.show_progress {
            let bar = ui::download_bar(&task.filename);
            let written = self
                .download_once(task, Some(ui::bar_callback(&bar)))
                .await?;
            // 节流可能吞掉最后一次采样，这里补足终态
            bar.set_length(written);
            bar.set_position(written);
            bar.finish();
            Ok(written)
        } else {
            self.download_once(task, None).await
        }
    }

    /// 完整下载一次，进度交给外部回调（观测接口，无背压）
    pub async fn download_with_callback(
        &self,
        task: &DownloadTask,
        callback: ProgressCallback,
    ) -> DownloadResult<u64> {
        self.download_once(task, Some(callback)).await
    }

    async fn download_once(
        &self,
        task: &DownloadTask,
        callback: Option<ProgressCallback>,
    ) -> DownloadResult<u64> {
        log::info!("开始下载: {}", task.url);

        fs::create_dir_all(&task.output_dir)
            .await
            .map_err(|e| DownloadError::filesystem("创建输出目录失败", e))?;

        let response = self.get(&task.url, None).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::network(format!("服务器返回错误状态: {}", status)));
        }

        let total = response.content_length().unwrap_or(0);
        let path = task.output_path();
        let mut file = File::create(&path)
            .await
            .map_err(|e| DownloadError::filesystem("创建文件失败", e))?;

        let mut stream: ByteStream = response.bytes_stream().boxed();
        if let Some(cb) = callback {
            stream = ProgressStream::new(stream, total, cb).boxed();
        }

        // 写盘可能推迟到 flush 才报错，和拷贝失败走同一条清理路径
        let copied = match Self::copy_stream(&mut stream, &mut file).await {
            Ok(written) => file
                .flush()
                .await
                .map(|_| written)
                .map_err(|e| DownloadError::filesystem("刷新文件失败", e)),
            Err(e) => Err(e),
        };

        match copied {
            Ok(written) => {
                log::info!("下载完成: {} ({} 字节)", path.display(), written);
                Ok(written)
            }
            Err(e) => {
                // 非断点下载的约定：不留下截断的垃圾文件
                drop(file);
                let _ = fs::remove_file(&path).await;
                Err(e)
            }
        }
    }

    /// 支持断点续传的下载
    ///
    /// 状态机：检查本地文件得到续传偏移 S；S > 0 时带 Range 请求。
    /// 服务器返回 206 则追加写入；返回 200 说明不支持续传，
    /// 丢弃 S 并以截断模式重新创建文件（追加会产生超长的损坏文件）；
    /// 其它状态视为网络错误。中途失败保留已写入部分。
    pub async fn download_resumable(&self, task: &DownloadTask) -> DownloadResult<u64> {
        fs::create_dir_all(&task.output_dir)
            .await
            .map_err(|e| DownloadError::filesystem("创建输出目录失败", e))?;

        let path = task.output_path();
        let mut start = match fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        if start > 0 {
            log::info!("发现未完成的文件，从 {} 字节处续传: {}", start, path.display());
        }

        let response = self
            .get(&task.url, if start > 0 { Some(start) } else { None })
            .await?;
        let status = response.status();

        let (mut file, total) = if start > 0 && status == StatusCode::PARTIAL_CONTENT {
            // 服务器接受了范围请求，继续写在文件末尾
            let file = OpenOptions::new()
                .append(true)
                .open(&path)
                .await
                .map_err(|e| DownloadError::filesystem("打开文件失败", e))?;
            (file, start + response.content_length().unwrap_or(0))
        } else if status.is_success() {
            if start > 0 {
                log::warn!("服务器不支持断点续传，从头下载: {}", task.url);
                start = 0;
            }
            let file = File::create(&path)
                .await
                .map_err(|e| DownloadError::filesystem("创建文件失败", e))?;
            (file, response.content_length().unwrap_or(0))
        } else {
            return Err(DownloadError::network(format!("服务器返回错误状态: {}", status)));
        };

        let bar = if task.show_progress {
            Some(ui::download_bar(&task.filename))
        } else {
            None
        };

        let mut stream: ByteStream = response.bytes_stream().boxed();
        if let Some(bar) = &bar {
            // 计数器以 S 为起点，百分比和速度按整个文件计算
            stream = ProgressStream::new(stream, total, ui::bar_callback(bar))
                .with_offset(start)
                .boxed();
        }

        // 中途失败不删除文件，下一次尝试可以从新的偏移继续
        let written = Self::copy_stream(&mut stream, &mut file).await?;
        file.flush()
            .await
            .map_err(|e| DownloadError::filesystem("刷新文件失败", e))?;

        if let Some(bar) = bar {
            bar.set_length(start + written);
            bar.set_position(start + written);
            bar.finish();
        }

        log::info!("下载完成: {} ({} 字节)", path.display(), start + written);
        Ok(start + written)
    }

    async fn get(
        &self,
        url: &str,
        range_from: Option<u64>,
    ) -> DownloadResult<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(start) = range_from {
            request = request.header(reqwest::header::RANGE, format!("bytes={}-", start));
        }
        request
            .send()
            .await
            .map_err(|e| DownloadError::network_caused("请求失败", e))
    }

    async fn copy_stream(
        stream: &mut ByteStream,
        file: &mut File,
    ) -> DownloadResult<u64> {
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::download("读取响应流失败", e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::download("写入文件失败", e))?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}
