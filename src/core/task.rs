use std::path::{Path, PathBuf};

use crate::core::error::{DownloadError, DownloadResult};

/// 单个下载任务的描述
///
/// 文件名假定已由调用方消毒（见 `utils::naming::sanitize_filename`），
/// 任务一经创建不再修改。
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub output_dir: PathBuf,
    pub filename: String,
    pub show_progress: bool,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        DownloadTask {
            url: url.into(),
            output_dir: output_dir.into(),
            filename: filename.into(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// 目标文件的完整路径
    pub fn output_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(&self.filename)
    }
}

/// 单个任务的最终结果，保留任务在批次中的序号，
/// 失败时调用方可以据此定位到具体任务。
#[derive(Debug)]
pub struct TaskResult {
    pub index: usize,
    pub filename: String,
    pub bytes: u64,
    pub error: Option<DownloadError>,
}

impl TaskResult {
    pub fn completed(index: usize, filename: String, bytes: u64) -> Self {
        TaskResult { index, filename, bytes, error: None }
    }

    pub fn failed(index: usize, filename: String, error: DownloadError) -> Self {
        TaskResult { index, filename, bytes: 0, error: Some(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 一个批次的全部任务结果
///
/// 聚合为三种形态：全部成功 / 全部失败（携带第一个失败原因）/
/// 部分失败（只报计数）。逐任务的错误细节保留在 `results` 中。
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<TaskResult>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_ok()).count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.results.iter().map(|r| r.bytes).sum()
    }

    /// 批次序号最小的失败任务（即最先派发的失败任务）
    pub fn first_failure(&self) -> Option<&TaskResult> {
        self.results
            .iter()
            .filter(|r| !r.is_ok())
            .min_by_key(|r| r.index)
    }

    pub fn result(&self) -> DownloadResult<()> {
        let total = self.total();
        let failed = self.failed_count();
        if failed == 0 {
            return Ok(());
        }
        if failed == total {
            let first = self
                .first_failure()
                .and_then(|r| r.error.as_ref())
                .map(|e| e.to_string())
                .unwrap_or_else(|| "未知原因".to_string());
            return Err(DownloadError::AllFailed { total, first });
        }
        Err(DownloadError::PartialFailure { failed, total })
    }
}
