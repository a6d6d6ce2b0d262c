// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 配置参数 (JSON + 命令行)
pub mod detection; // 人员检测
pub mod error; // 错误类型
pub mod input; // 视频输入与帧提取
pub mod logging; // 日志初始化
pub mod pipeline; // 处理流水线
pub mod recording; // 自动录像
pub mod session; // 会话线程

pub use crate::config::{Args, LoadOutcome, LogLevel, SentinelConfig};
pub use crate::error::{SentinelError, SentinelResult};
pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineStats};
pub use crate::session::{spawn_session, SessionHandle, StopHandle};

/// 本地时间字符串,各字段以 `delimiter` 分隔
pub fn gen_time_string(delimiter: &str) -> String {
    let fmt = format!(
        "%Y{}%m{}%d_%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter
    );
    chrono::Local::now().format(&fmt).to_string()
}
