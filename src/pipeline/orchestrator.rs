// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 流水线编排 (Pipeline Orchestrator)
/// 职责: 字节块 → 提取帧 → 解码 → 检测 → 判定 → 录像控制
///
/// 同一会话内的帧严格按提取顺序逐个处理,不并行、不重排
use super::stats::{PipelineStats, StatsReporter};
use crate::detection::{DetectionClassifier, ObjectDetector};
use crate::input::{ChunkSource, EncodedFrame, FrameDecoder, FrameExtractor};
use crate::recording::{RecorderConfig, RecordingController, Transition, VideoSink};
use std::time::Instant;
use tracing::{error, info, warn};

/// 时钟接口 (测试中可替换)
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 流水线参数
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub classifier: DetectionClassifier,
    pub recorder: RecorderConfig,
    pub max_frame_bytes: usize,
}

/// 单帧处理结果
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub seq: u64,
    /// None: 解码失败,该帧被跳过
    pub person_detected: Option<bool>,
    /// None: 帧被跳过或录像输出出错
    pub transition: Option<Transition>,
}

pub struct Pipeline<D, O, S, C = SystemClock>
where
    S: VideoSink,
{
    extractor: FrameExtractor,
    decoder: D,
    detector: O,
    classifier: DetectionClassifier,
    controller: RecordingController<S>,
    clock: C,

    // 统计
    stats: PipelineStats,
    reporter: StatsReporter,
}

impl<D, O, S, C> Pipeline<D, O, S, C>
where
    D: FrameDecoder,
    O: ObjectDetector,
    S: VideoSink,
    C: Clock,
{
    pub fn new(decoder: D, detector: O, sink: S, clock: C, config: PipelineConfig) -> Self {
        Self {
            extractor: FrameExtractor::new(config.max_frame_bytes),
            decoder,
            detector,
            classifier: config.classifier,
            controller: RecordingController::new(sink, config.recorder),
            clock,
            stats: PipelineStats::default(),
            reporter: StatsReporter::default(),
        }
    }

    /// 处理一个字节块,返回其中每一帧的处理结果
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Vec<FrameReport> {
        self.stats.chunks += 1;
        self.stats.bytes += chunk.len() as u64;

        let frames = self.extractor.submit(chunk);
        let reports = frames.iter().map(|frame| self.process_frame(frame)).collect();

        self.sync_stats();
        self.reporter.tick(&self.stats, self.controller.is_recording());
        reports
    }

    /// 处理单个完整帧
    pub fn process_frame(&mut self, frame: &EncodedFrame) -> FrameReport {
        self.stats.frames += 1;

        let image = match self.decoder.decode(frame) {
            Ok(image) => image,
            Err(e) => {
                warn!("⚠️ 跳过帧 #{}: {}", frame.seq, e);
                self.stats.decode_failures += 1;
                return FrameReport {
                    seq: frame.seq,
                    person_detected: None,
                    transition: None,
                };
            }
        };

        // 推理失败按"无人"处理: 宁可不录,不中断
        let person_detected = match self.detector.detect(&image) {
            Ok(records) => self.classifier.classify(&records),
            Err(e) => {
                warn!("⚠️ 帧 #{} 推理失败, 按无人处理: {}", frame.seq, e);
                self.stats.inference_failures += 1;
                false
            }
        };
        if person_detected {
            self.stats.person_frames += 1;
        }

        let now = self.clock.now();
        let transition = match self.controller.on_frame(&image, person_detected, now) {
            Ok(transition) => Some(transition),
            Err(e) => {
                error!("❌ 帧 #{} 录像失败, 已结束当前录像: {}", frame.seq, e);
                self.stats.sink_failures += 1;
                None
            }
        };

        FrameReport {
            seq: frame.seq,
            person_detected: Some(person_detected),
            transition,
        }
    }

    /// 消费整个输入源直到流结束或传输中断,然后收尾
    pub fn run<T: ChunkSource + ?Sized>(&mut self, source: &mut T) -> PipelineStats {
        loop {
            match source.next_chunk() {
                Ok(Some(chunk)) => {
                    self.process_chunk(&chunk);
                }
                Ok(None) => {
                    info!("📭 视频流结束");
                    break;
                }
                Err(e) => {
                    warn!("⚠️ 视频流中断, 结束会话: {}", e);
                    break;
                }
            }
        }
        self.shutdown()
    }

    /// 会话收尾: 关闭进行中的录像,丢弃残留数据
    pub fn shutdown(&mut self) -> PipelineStats {
        if let Err(e) = self.controller.finish(self.clock.now()) {
            error!("❌ 关闭录像失败: {}", e);
            self.stats.sink_failures += 1;
        }
        self.extractor.reset();
        self.sync_stats();

        info!(
            "✅ 会话结束: {} 帧, 录像 {} 段, 解码失败 {}, 推理失败 {}, 录像失败 {}",
            self.stats.frames,
            self.stats.sessions_completed,
            self.stats.decode_failures,
            self.stats.inference_failures,
            self.stats.sink_failures
        );
        self.stats.clone()
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn is_recording(&self) -> bool {
        self.controller.is_recording()
    }

    pub fn controller(&self) -> &RecordingController<S> {
        &self.controller
    }

    fn sync_stats(&mut self) {
        self.stats.discarded_bytes = self.extractor.discarded_bytes();
        self.stats.sessions_started = self.controller.sessions_started();
        self.stats.sessions_completed = self.controller.sessions_completed();
        self.stats.frames_recorded = self.controller.frames_written();
    }
}
