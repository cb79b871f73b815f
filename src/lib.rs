//! mediadown: 并发媒体文件下载引擎
//!
//! 核心是带并发上限的批量传输引擎：有界工作池、逐任务的
//! 重试/退避策略、可断点续传的传输状态机，以及字节流上的
//! 节流进度装饰器。媒体元数据解析通过 `extractor::MediaResolver`
//! 对接外部实现。

pub mod cli;
pub mod config;
pub mod core;
pub mod extractor;
pub mod ui;
pub mod utils;
