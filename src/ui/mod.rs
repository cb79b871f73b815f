mod progress;

use std::fmt;
use std::time::Duration;

pub use progress::{bar_callback, download_bar, format_speed};

use crate::core::task::BatchOutcome;

pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

pub fn print_error(message: &str) {
    println!("✗ {}", message);
}

/// 一个批次结束后的汇总信息
pub struct DownloadSummary {
    pub total_files: usize,
    pub total_size: u64,
    pub elapsed_time: Duration,
    pub success_count: usize,
    pub failed_count: usize,
}

impl DownloadSummary {
    pub fn from_outcome(outcome: &BatchOutcome, elapsed: Duration) -> Self {
        DownloadSummary {
            total_files: outcome.total(),
            total_size: outcome.total_bytes(),
            elapsed_time: elapsed,
            success_count: outcome.success_count(),
            failed_count: outcome.failed_count(),
        }
    }
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n下载摘要:")?;
        writeln!(f, "总文件数: {}", self.total_files)?;
        writeln!(f, "总大小: {}", format_size(self.total_size))?;
        writeln!(f, "耗时: {:.2}秒", self.elapsed_time.as_secs_f64())?;
        if self.elapsed_time.as_secs_f64() > 0.0 {
            let speed = self.total_size as f64 / self.elapsed_time.as_secs_f64();
            writeln!(f, "平均速度: {}", format_speed(speed))?;
        }
        writeln!(f, "成功: {}", self.success_count)?;
        writeln!(f, "失败: {}", self.failed_count)?;
        Ok(())
    }
}

fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
