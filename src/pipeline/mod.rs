// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频处理流水线 (Video Processing Pipeline)
///
/// 单会话单工作者,严格按帧顺序处理:
/// - Extractor:  字节块 → 完整JPEG帧
/// - Decoder:    JPEG → RGB
/// - Detector:   目标检测 → 人员判定
/// - Controller: 录像开始/停止
pub mod orchestrator;
pub mod stats;

pub use orchestrator::{Clock, FrameReport, Pipeline, PipelineConfig, SystemClock};
pub use stats::{PipelineStats, StatsReporter};
