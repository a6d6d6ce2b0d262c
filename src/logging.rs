// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 日志初始化: 控制台 + 可选的按天轮转文件日志 (异步非阻塞)

use crate::config::LogLevel;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "sentinel.log";
/// 日志保留天数
const LOG_RETENTION_DAYS: u64 = 7;

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置的级别。指定 `log_dir` 时返回 WorkerGuard,
/// 必须在 main 中保持存活,否则异步日志线程会提前退出
pub fn init_logging(level: LogLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter_string = format!("{},ureq=warn,ort=warn", level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_string));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_thread_names(true);

    let (file_layer, guard) = match log_dir.and_then(file_writer) {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false) // 文件不需要 ANSI 颜色码
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // 已经初始化过 (例如测试中) 则忽略
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}

fn file_writer(
    log_dir: &Path,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("创建日志目录失败 {}: {}", log_dir.display(), e);
        return None;
    }

    cleanup_old_logs(log_dir, Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60));

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}

/// 清理超过保留期限的旧日志文件,返回删除数量
fn cleanup_old_logs(log_dir: &Path, retention: Duration) -> usize {
    let now = SystemTime::now();
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX));
        if !is_log {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => continue,
        };

        if let Ok(age) = now.duration_since(modified) {
            if age > retention {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => eprintln!("删除旧日志文件失败 {:?}: {}", path, e),
                }
            }
        }
    }
    removed
}
