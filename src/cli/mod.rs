//! CLI: 命令行接口和参数解析模块
//!
//! - 命令行参数解析和验证
//! - 配置文件路径管理
//! - URL 列表处理（命令行参数和文件）
//!
//! 支持的用法：
//! - 基本下载：`mediadown <url>`
//! - 批量下载：`mediadown -f urls.txt`
//! - 断点续传：`mediadown -r <url>`
//! - 编辑配置：`mediadown -e`

use clap::Parser;
use std::env;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::core::error::DownloadError;
use crate::utils::validator;

/// 获取平台默认配置文件路径
pub fn default_config_path() -> String {
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        format!("{}/mediadown/mediadown.conf", appdata)
    }
    #[cfg(target_os = "macos")]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/Library/Application Support/mediadown/mediadown.conf", home)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/.config/mediadown/mediadown.conf", home)
    }
}

/// 打开配置文件编辑器
pub fn open_config_in_editor(config_path: &str) {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("notepad").arg(config_path).status().ok();
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg("-e").arg(config_path).status().ok();
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // 优先 xdg-open，否则 nano
        if std::process::Command::new("xdg-open").arg(config_path).status().is_err() {
            let _ = std::process::Command::new("nano").arg(config_path).status();
        }
    }
}

/// mediadown 命令行参数
///
/// 示例用法：
///   mediadown https://example.com/video.mp4
///   mediadown -f urls.txt -w 5
///   mediadown -r https://example.com/big.mp4
#[derive(Parser, Debug, Clone)]
#[command(
    name = "mediadown",
    author = "panzhifu",
    version = env!("CARGO_PKG_VERSION"),
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (构建于 ", env!("VERGEN_BUILD_TIMESTAMP"), ")"),
    about = "一个用 Rust 编写的并发媒体文件下载工具",
    long_about = "支持并发批量下载、断点续传、自动重试和实时进度显示的媒体文件下载工具。\n\n示例：\n  mediadown https://example.com/video.mp4\n  mediadown -f urls.txt -w 5\n  mediadown -r https://example.com/big.mp4\n"
)]
pub struct Args {
    /// 要下载的URL列表（可同时指定多个）
    #[arg(required = false, help = "要下载的URL列表，可以同时指定多个URL。")]
    pub urls: Vec<String>,

    /// 包含URL列表的文件路径
    #[arg(short, long, help = "包含URL列表的文件路径，每行一个URL。")]
    pub file: Option<String>,

    /// 配置文件路径，默认为平台推荐路径
    #[arg(short = 'c', long, default_value_t = default_config_path(), help = "配置文件路径，默认为平台推荐路径。")]
    pub config: String,

    /// 编辑配置文件（-e 或 --edit）
    #[arg(short = 'e', long = "edit", help = "用系统默认编辑器打开配置文件并退出。")]
    pub edit_config: bool,

    /// 指定下载目录
    #[arg(long, short = 'd', default_value = "", help = "指定下载目录，覆盖配置文件中的设置。")]
    pub download_dir: String,

    /// 指定下载文件名
    #[arg(long, short = 'n', help = "指定下载文件名，覆盖URL自动推断，仅对单个URL有效。")]
    pub file_name: Option<String>,

    /// 最大并发下载数
    #[arg(long, short = 'w', help = "最大并发下载数，覆盖配置文件中的设置。")]
    pub workers: Option<usize>,

    /// 启用断点续传
    #[arg(long, short = 'r', help = "启用断点续传，失败重试时从已下载的部分继续。")]
    pub resume: bool,
}

impl Args {
    /// 解析命令行参数并加载（或创建）配置
    pub fn parse_args() -> Result<(Self, Config), DownloadError> {
        let args = Args::parse();

        if args.edit_config {
            open_config_in_editor(&args.config);
            std::process::exit(0);
        }

        let mut config = Config::load(&args.config)?;
        config.merge_from_args(&args);
        config.validate()?;

        Ok((args, config))
    }

    /// 收集命令行和文件中的URL
    pub fn get_urls(&self) -> Result<Vec<String>, DownloadError> {
        let mut urls = Vec::new();
        urls.extend_from_slice(&self.urls);

        if let Some(file_path) = &self.file {
            if !Path::new(file_path).exists() {
                return Err(DownloadError::Unknown(format!("URL文件不存在: {}", file_path)));
            }
            let content = fs::read_to_string(file_path)
                .map_err(|e| DownloadError::filesystem("读取URL文件失败", e))?;

            // 按行读取URL，忽略空行和注释
            for line in content.lines() {
                let line = line.trim();
                if !line.is_empty() && !line.starts_with('#') {
                    urls.push(line.to_string());
                }
            }
        }

        if urls.is_empty() {
            return Err(DownloadError::InvalidUrl(
                "未提供任何URL。请通过命令行参数或文件提供至少一个URL。".to_string(),
            ));
        }

        for url in &urls {
            if !validator::is_valid_url(url) {
                return Err(DownloadError::InvalidUrl(url.clone()));
            }
        }

        Ok(urls)
    }
}
