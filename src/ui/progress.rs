use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::progress::{ProgressCallback, ProgressSample};

/// 创建单个下载的进度条，总大小由第一个进度采样回填
pub fn download_bar(filename: &str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} ETA:{eta}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("=>-"));
    bar.set_message(filename.to_string());
    bar
}

/// 把进度采样接到进度条上
pub fn bar_callback(bar: &ProgressBar) -> ProgressCallback {
    let bar = bar.clone();
    Arc::new(move |sample: ProgressSample| {
        if sample.total > 0 {
            bar.set_length(sample.total);
        }
        bar.set_position(sample.downloaded);
    })
}

/// 速度格式化
pub fn format_speed(speed: f64) -> String {
    if speed > 1024.0 * 1024.0 {
        format!("{:.2} MB/s", speed / (1024.0 * 1024.0))
    } else if speed > 1024.0 {
        format!("{:.2} KB/s", speed / 1024.0)
    } else {
        format!("{:.0} B/s", speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(512.0), "512 B/s");
        assert_eq!(format_speed(2048.0), "2.00 KB/s");
        assert_eq!(format_speed(3.0 * 1024.0 * 1024.0), "3.00 MB/s");
    }

    #[test]
    fn test_bar_callback_updates_position() {
        let bar = ProgressBar::hidden();
        let callback = bar_callback(&bar);
        callback(ProgressSample { downloaded: 50, total: 100, speed: 10.0 });
        assert_eq!(bar.position(), 50);
        assert_eq!(bar.length(), Some(100));
    }
}
