use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::DownloadError;

/// 配置结构体
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// 默认下载目录
    pub download_dir: String,
    /// 最大并发下载数
    pub max_concurrent_downloads: usize,
    /// 整个请求的超时时间（秒），也是批次共享的截止时间
    pub timeout: u64,
    /// User-Agent
    pub user_agent: String,
    /// 是否启用断点续传
    pub enable_resume: bool,
    /// 重试次数（含第一次尝试）
    pub retry_count: usize,
    /// 首次重试延迟（秒），之后指数翻倍
    pub retry_delay: u64,
    /// 默认质量（best/worst/具体档位）
    pub default_quality: String,
    /// 只下载音频
    pub audio_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: "./downloads".to_string(),
            max_concurrent_downloads: 3,
            timeout: 1800, // 大文件下载，默认30分钟
            user_agent: "mediadown/1.0".to_string(),
            enable_resume: false,
            retry_count: 3,
            retry_delay: 2,
            default_quality: "best".to_string(),
            audio_only: false,
        }
    }
}

impl Config {
    /// 加载配置文件，格式错误或文件不存在时落回默认配置并写回
    pub fn load(path: &str) -> Result<Self, DownloadError> {
        if Path::new(path).exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| DownloadError::filesystem("读取配置文件失败", e))?;
            match toml::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    eprintln!("配置文件格式错误: {}，将使用默认配置", e);
                    let config = Config::default();
                    config.save(path)?;
                    Ok(config)
                }
            }
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// 保存配置文件，带简短的说明头
    pub fn save(&self, path: &str) -> Result<(), DownloadError> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DownloadError::filesystem("创建配置目录失败", e))?;
        }
        let header = "\
# mediadown 配置文件
# =====================
# 命令行参数会覆盖这里的设置，优先级：命令行 > 配置文件 > 默认值
#
# download_dir              默认下载目录
# max_concurrent_downloads  同时进行的下载任务数（建议 1-5）
# timeout                   单个请求的超时时间（秒）
# user_agent                请求使用的 User-Agent
# enable_resume             是否启用断点续传
# retry_count               失败后的总尝试次数
# retry_delay               首次重试延迟（秒），之后指数翻倍
# default_quality           格式选择：best / worst / 720p 等
# audio_only                只下载音频
";
        let body = toml::to_string_pretty(self)
            .map_err(|e| DownloadError::Unknown(format!("无法序列化配置: {}", e)))?;
        fs::write(path, format!("{}\n{}", header, body))
            .map_err(|e| DownloadError::filesystem("写入配置文件失败", e))?;
        Ok(())
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.max_concurrent_downloads == 0 {
            return Err(DownloadError::Unknown("并发下载数必须大于0".to_string()));
        }
        if self.timeout == 0 {
            return Err(DownloadError::Unknown("超时时间必须大于0".to_string()));
        }
        if self.download_dir.is_empty() {
            return Err(DownloadError::Unknown("下载目录不能为空".to_string()));
        }
        if self.retry_count == 0 {
            return Err(DownloadError::Unknown("重试次数必须大于0".to_string()));
        }
        Ok(())
    }

    /// 合并命令行参数到配置（命令行优先）
    pub fn merge_from_args(&mut self, args: &crate::cli::Args) {
        if !args.download_dir.is_empty() {
            self.download_dir = args.download_dir.clone();
        }
        if let Some(workers) = args.workers {
            self.max_concurrent_downloads = workers;
        }
        if args.resume {
            self.enable_resume = true;
        }
    }

    /// 获取配置摘要信息
    pub fn get_summary(&self) -> String {
        format!(
            "配置摘要:\n\
            - 下载目录: {}\n\
            - 并发数: {}\n\
            - 超时时间: {} 秒\n\
            - 重试次数: {}\n\
            - 断点续传: {}",
            self.download_dir,
            self.max_concurrent_downloads,
            self.timeout,
            self.retry_count,
            if self.enable_resume { "启用" } else { "禁用" }
        )
    }
}
