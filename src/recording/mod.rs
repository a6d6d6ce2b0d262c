// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 录像系统 (Recording System)
///
/// - Controller: 有人/无人信号 → 开始/停止录像 (带冷却时间)
/// - Sink:       录像输出 (ffmpeg 子进程编码)
pub mod controller;
pub mod sink;

pub use controller::{RecorderConfig, RecordingController, RecordingSession, Transition};
pub use sink::{FfmpegSink, FfmpegWriter, FrameSize, VideoSink, VideoWriter};
