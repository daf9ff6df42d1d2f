//! 日志系统: 彩色控制台输出 + 按日期命名的文件输出.
//!
//! 库 crate 通过 `log` 门面记录日志, 这里安装的 tracing 订阅器会一并接收.
//! 设置环境变量 `AV1MV_LOG` 可覆盖文件日志的过滤规则.

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// 覆盖文件日志过滤规则的环境变量
pub const LOG_ENV: &str = "AV1MV_LOG";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 文件日志级别 (`EnvFilter` 语法)
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    /// 控制台日志级别
    #[serde(default = "default_console_level")]
    pub console_level: String,
}

fn default_console_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    pub fn new(level: &str, directory: impl AsRef<Path>, file_prefix: &str) -> Self {
        Self {
            level: level.to_string(),
            directory: directory.as_ref().to_string_lossy().into_owned(),
            file_prefix: file_prefix.to_string(),
            console_level: default_console_level(),
        }
    }

    /// 本次运行写入的日志文件
    pub fn current_log_path(&self) -> PathBuf {
        build_current_log_path(
            Path::new(&self.directory),
            &self.file_prefix,
            Local::now().date_naive(),
        )
    }

    /// 文件过滤规则: 环境变量优先
    fn file_filter(&self) -> String {
        std::env::var(LOG_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.level.clone())
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 安装全局订阅器, 每个进程只能成功调用一次
pub fn init(config: LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("创建日志目录失败, path={}", config.directory))?;

    let file = open_append_file(&config.current_log_path())?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let console_filter = EnvFilter::try_new(&config.console_level)
        .with_context(|| format!("无效的控制台日志级别: {}", config.console_level))?;
    let file_rule = config.file_filter();
    let file_filter = EnvFilter::try_new(&file_rule)
        .with_context(|| format!("无效的文件日志级别: {file_rule}"))?;

    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(ConsoleFormatter)
        .with_filter(console_filter);

    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("日志系统已经初始化")?;
    LOG_GUARD.set(guard).ok();
    Ok(())
}

fn open_append_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败, path={}", path.display()))
}

pub(crate) fn build_current_log_path(directory: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    directory.join(format!("{}.{}.log", prefix, date.format("%Y-%m-%d")))
}

fn write_timestamp(writer: &mut Writer<'_>) -> std::fmt::Result {
    let now = Local::now();
    write!(
        writer,
        "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_millis()
    )
}

struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write_timestamp(&mut writer)?;
        let color = match *meta.level() {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        };
        write!(
            writer,
            "{}{:5}\x1b[0m {} > ",
            color,
            meta.level().to_string(),
            meta.target()
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write_timestamp(&mut writer)?;
        write!(
            writer,
            "{:5} {}:{} > ",
            meta.level().to_string(),
            meta.file().unwrap_or("unknown"),
            meta.line().unwrap_or(0)
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_current_log_path() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 6);
        match date {
            Some(date) => {
                let path = build_current_log_path(Path::new("logs"), "av1mv", date);
                assert_eq!(path, PathBuf::from("logs/av1mv.2026-02-06.log"));
            }
            None => panic!("测试日期初始化失败"),
        }
    }

    #[test]
    fn test_config_defaults_console_level() {
        let json = r#"{"level": "debug", "directory": "logs", "file_prefix": "probe"}"#;
        let config: LoggingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.console_level, "info");
        assert_eq!(config.file_prefix, "probe");
    }
}
