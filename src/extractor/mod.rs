//! Extractor: 媒体元数据解析器的对接层
//!
//! 引擎本身不解析站点页面。具体站点的解析实现 `MediaResolver`，
//! 产出可直接下载的地址和格式列表；这里负责格式选择，
//! 以及把解析结果转换成下载任务（标题消毒 + 按MIME定扩展名）。

use std::path::Path;

use async_trait::async_trait;

use crate::core::error::{DownloadError, DownloadResult};
use crate::core::task::DownloadTask;
use crate::utils::naming::{extension_for_mime, sanitize_filename};

/// 一种可下载的编码格式
#[derive(Debug, Clone)]
pub struct FormatInfo {
    pub quality: String,
    pub mime_type: String,
    pub url: String,
    /// 预期大小（字节），0 表示未知
    pub filesize: u64,
    pub audio_only: bool,
    pub video_only: bool,
}

/// 解析出的媒体信息
#[derive(Debug, Clone)]
pub struct MediaDetails {
    pub id: String,
    pub title: String,
    pub author: String,
    pub duration: String,
    pub thumbnail: String,
    /// 按大小降序排列（最优在前）
    pub formats: Vec<FormatInfo>,
}

/// 元数据解析器：把一个来源定位符解析成可下载的媒体信息
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, locator: &str) -> DownloadResult<MediaDetails>;
}

/// 按质量要求选择格式
///
/// audio_only 优先返回第一个纯音频格式；
/// "best"/"worst" 取两端；指定质量找不到时回退到最优。
pub fn select_format<'a>(
    formats: &'a [FormatInfo],
    quality: &str,
    audio_only: bool,
) -> DownloadResult<&'a FormatInfo> {
    if formats.is_empty() {
        return Err(DownloadError::Unknown("没有可用的格式".to_string()));
    }

    if audio_only {
        return formats
            .iter()
            .find(|f| f.audio_only)
            .ok_or_else(|| DownloadError::Unknown("没有纯音频格式".to_string()));
    }

    match quality {
        "best" => Ok(&formats[0]),
        "worst" => Ok(&formats[formats.len() - 1]),
        _ => Ok(formats
            .iter()
            .find(|f| f.quality == quality)
            .unwrap_or(&formats[0])),
    }
}

impl MediaDetails {
    /// 用选定的格式构造下载任务，标题消毒后拼上MIME推断的扩展名
    pub fn to_task(&self, format: &FormatInfo, output_dir: &Path) -> DownloadTask {
        let filename = format!(
            "{}{}",
            sanitize_filename(&self.title),
            extension_for_mime(&format.mime_type)
        );
        DownloadTask::new(format.url.clone(), output_dir, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_formats() -> Vec<FormatInfo> {
        vec![
            FormatInfo {
                quality: "1080p".to_string(),
                mime_type: "video/mp4".to_string(),
                url: "https://cdn.example.com/v/1080".to_string(),
                filesize: 900,
                audio_only: false,
                video_only: false,
            },
            FormatInfo {
                quality: "720p".to_string(),
                mime_type: "video/webm".to_string(),
                url: "https://cdn.example.com/v/720".to_string(),
                filesize: 500,
                audio_only: false,
                video_only: false,
            },
            FormatInfo {
                quality: "audio".to_string(),
                mime_type: "audio/m4a".to_string(),
                url: "https://cdn.example.com/a/128".to_string(),
                filesize: 100,
                audio_only: true,
                video_only: false,
            },
        ]
    }

    #[test]
    fn test_select_best_and_worst() {
        let formats = sample_formats();
        assert_eq!(select_format(&formats, "best", false).unwrap().quality, "1080p");
        assert_eq!(select_format(&formats, "worst", false).unwrap().quality, "audio");
    }

    #[test]
    fn test_select_named_quality_with_fallback() {
        let formats = sample_formats();
        assert_eq!(select_format(&formats, "720p", false).unwrap().quality, "720p");
        // 找不到指定质量时回退到最优
        assert_eq!(select_format(&formats, "480p", false).unwrap().quality, "1080p");
    }

    #[test]
    fn test_select_audio_only() {
        let formats = sample_formats();
        let format = select_format(&formats, "best", true).unwrap();
        assert!(format.audio_only);
        assert_eq!(format.mime_type, "audio/m4a");
    }

    #[test]
    fn test_select_from_empty() {
        assert!(select_format(&[], "best", false).is_err());
    }

    #[test]
    fn test_to_task_sanitizes_title() {
        let formats = sample_formats();
        let details = MediaDetails {
            id: "abc123".to_string(),
            title: "测试视频: 第1集?".to_string(),
            author: "作者".to_string(),
            duration: "3m20s".to_string(),
            thumbnail: String::new(),
            formats,
        };
        let format = select_format(&details.formats, "best", false).unwrap();
        let task = details.to_task(format, &PathBuf::from("/tmp/out"));
        assert_eq!(task.filename, "测试视频_ 第1集_.mp4");
        assert_eq!(task.url, "https://cdn.example.com/v/1080");
    }
}
