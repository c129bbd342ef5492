//! 日志初始化：控制台与文件共用 tracing_subscriber 的 fmt layer。

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::{FmtSpan, Writer},
    fmt::time::FormatTime,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// 本地时间戳，格式 `YYYY-MM-DD HH:MM:SS`。
struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(TIMESTAMP_FORMAT))
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 初始化全局 tracing 订阅者。
///
/// 同一份输出通过 Tee 同时写入 stdout 与 `log_file_path`（追加模式，不存在则创建，父目录自动创建）。
/// 日志级别优先读取 RUST_LOG；未设置时使用 `default_level`（如 `info`、`debug`）。
/// 需在调用前加载 .env，否则 RUST_LOG 不会生效。
pub fn init_tracing(log_file_path: &str, default_level: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(log_file_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    let file = Arc::new(file);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let writer = io::stdout.and(file);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_timer(LocalTimestamp)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
