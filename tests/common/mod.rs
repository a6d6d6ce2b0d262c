// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

// 集成测试用的替身: 解码器 / 检测器 / 录像输出 / 时钟
//
// 帧格式: FF D8 <tag> FF D9,tag 决定检测结果:
//   b'P' 有人 (0.9)   b'L' 有人但置信度低 (0.3)   b'C' 其他类别
//   b'E' 推理失败     b'X' 解码失败               其他 无目标
#![allow(dead_code)]

use image::{Rgb, RgbImage};
use sentinel_recorder::detection::{DetectionRecord, ObjectDetector};
use sentinel_recorder::input::{EncodedFrame, FrameDecoder};
use sentinel_recorder::pipeline::{Clock, Pipeline, PipelineConfig};
use sentinel_recorder::recording::{FrameSize, RecorderConfig, VideoSink, VideoWriter};
use sentinel_recorder::{SentinelError, SentinelResult};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const PERSON: u8 = b'P';
pub const LOW_CONFIDENCE: u8 = b'L';
pub const OTHER_CLASS: u8 = b'C';
pub const EMPTY: u8 = b'N';
pub const INFERENCE_ERROR: u8 = b'E';
pub const CORRUPT: u8 = b'X';

/// 单字节负载的最小"JPEG"帧
pub fn frame(tag: u8) -> Vec<u8> {
    vec![0xFF, 0xD8, tag, 0xFF, 0xD9]
}

pub fn frames(tags: &[u8]) -> Vec<u8> {
    tags.iter().flat_map(|&t| frame(t)).collect()
}

/// 解码器: 把负载第一个字节写进像素
#[derive(Clone, Default)]
pub struct TagDecoder {
    pub seen: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FrameDecoder for TagDecoder {
    fn decode(&mut self, frame: &EncodedFrame) -> SentinelResult<RgbImage> {
        self.seen.lock().unwrap().push(frame.data.clone());
        let tag = frame.data.get(2).copied().unwrap_or(0);
        if tag == CORRUPT {
            return Err(SentinelError::Decode("corrupt".into()));
        }
        Ok(RgbImage::from_pixel(4, 4, Rgb([tag, 0, 0])))
    }
}

#[derive(Clone, Default)]
pub struct TagDetector;

impl ObjectDetector for TagDetector {
    fn detect(&mut self, image: &RgbImage) -> SentinelResult<Vec<DetectionRecord>> {
        match image.get_pixel(0, 0)[0] {
            PERSON => Ok(vec![
                DetectionRecord::new(7, 0.8),
                DetectionRecord::new(15, 0.9),
            ]),
            LOW_CONFIDENCE => Ok(vec![DetectionRecord::new(15, 0.3)]),
            OTHER_CLASS => Ok(vec![DetectionRecord::new(7, 0.95)]),
            INFERENCE_ERROR => Err(SentinelError::Inference("session lost".into())),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Default)]
pub struct SinkLog {
    pub opened: Vec<PathBuf>,
    pub writes: usize,
    pub finished: usize,
    pub fail_open: bool,
    pub fail_write: bool,
}

#[derive(Clone, Default)]
pub struct MockSink(pub Arc<Mutex<SinkLog>>);

impl MockSink {
    pub fn log(&self) -> std::sync::MutexGuard<'_, SinkLog> {
        self.0.lock().unwrap()
    }
}

pub struct MockWriter {
    log: Arc<Mutex<SinkLog>>,
    done: bool,
}

impl VideoSink for MockSink {
    type Writer = MockWriter;

    fn open(&mut self, path: &Path, _frame_rate: f64, _size: FrameSize) -> SentinelResult<MockWriter> {
        let mut log = self.0.lock().unwrap();
        if log.fail_open {
            return Err(SentinelError::Sink("no space left".into()));
        }
        log.opened.push(path.to_path_buf());
        Ok(MockWriter {
            log: self.0.clone(),
            done: false,
        })
    }
}

impl VideoWriter for MockWriter {
    fn write(&mut self, _frame: &RgbImage) -> SentinelResult<()> {
        let mut log = self.log.lock().unwrap();
        if log.fail_write {
            return Err(SentinelError::Sink("broken pipe".into()));
        }
        log.writes += 1;
        Ok(())
    }

    fn finish(&mut self) -> SentinelResult<()> {
        if !self.done {
            self.done = true;
            self.log.lock().unwrap().finished += 1;
        }
        Ok(())
    }
}

impl Drop for MockWriter {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

/// 手动推进的时钟
#[derive(Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn set_secs(&self, secs: f64) {
        *self.offset.lock().unwrap() = Duration::from_secs_f64(secs);
    }

    pub fn base(&self) -> Instant {
        self.base
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

pub type TestPipeline = Pipeline<TagDecoder, TagDetector, MockSink, ManualClock>;

pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        classifier: Default::default(),
        recorder: RecorderConfig {
            cooldown: Duration::from_secs(5),
            frame_rate: 20.0,
            output_template: "sentinel-test-clips/{seq}.mp4".to_string(),
        },
        max_frame_bytes: 1024,
    }
}

pub fn pipeline() -> (TestPipeline, TagDecoder, MockSink, ManualClock) {
    let decoder = TagDecoder::default();
    let sink = MockSink::default();
    let clock = ManualClock::new();
    let pipeline = Pipeline::new(
        decoder.clone(),
        TagDetector,
        sink.clone(),
        clock.clone(),
        test_config(),
    );
    (pipeline, decoder, sink, clock)
}
