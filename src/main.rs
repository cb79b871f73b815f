use std::sync::Arc;
use std::time::Instant;

use mediadown::cli;
use mediadown::config::Config;
use mediadown::core::{BatchDownloader, DownloadTask};
use mediadown::ui;
use mediadown::utils::naming::sanitize_filename;
use mediadown::utils::validator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 解析参数和配置
    let (args, config) = match cli::Args::parse_args() {
        Ok((args, config)) => (args, config),
        Err(e) => {
            eprintln!("参数解析失败: {}", e);
            std::process::exit(1);
        }
    };

    // 获取下载URL列表
    let urls = match args.get_urls() {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("获取URL列表失败: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("解析到 {} 个URL", urls.len());
    log::info!("{}", config.get_summary());

    let tasks = build_tasks(&urls, &args, &config);
    for task in &tasks {
        println!("✓ 创建下载任务: {}", task.filename);
    }

    println!("\n开始下载 {} 个任务...", tasks.len());

    let config = Arc::new(config);
    let batch = BatchDownloader::new(Arc::clone(&config));
    let started = Instant::now();
    let outcome = batch.download_all(tasks).await;

    println!("{}", ui::DownloadSummary::from_outcome(&outcome, started.elapsed()));
    for result in outcome.results.iter().filter(|r| !r.is_ok()) {
        if let Some(e) = &result.error {
            ui::print_error(&format!("任务 {} ({}): {}", result.index, result.filename, e));
        }
    }

    match outcome.result() {
        Ok(()) => {
            ui::print_success("全部下载完成");
            Ok(())
        }
        Err(e) => {
            log::error!("批量下载失败: {}", e);
            Err(e.into())
        }
    }
}

/// 为每个URL构造下载任务；只有单个URL时显示进度条
fn build_tasks(urls: &[String], args: &cli::Args, config: &Config) -> Vec<DownloadTask> {
    let show_progress = urls.len() == 1;
    urls.iter()
        .map(|url| {
            let filename = match (&args.file_name, urls.len()) {
                (Some(name), 1) => name.clone(),
                _ => derive_filename(url),
            };
            DownloadTask::new(url.clone(), &config.download_dir, filename)
                .with_progress(show_progress)
        })
        .collect()
}

/// 从URL推断文件名，推断不出时用时间戳兜底
fn derive_filename(url: &str) -> String {
    let name = validator::filename_from_url(url)
        .unwrap_or_else(|| format!("download_{}", chrono::Utc::now().timestamp()));
    sanitize_filename(&name)
}
