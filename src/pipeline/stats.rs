// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 流水线统计
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub chunks: u64,
    pub bytes: u64,
    pub frames: u64,             // 提取出的完整帧
    pub discarded_bytes: u64,    // 丢弃的噪声/残帧字节
    pub decode_failures: u64,    // 解码失败 (跳过)
    pub inference_failures: u64, // 推理失败 (按无人处理)
    pub person_frames: u64,      // 检测到人的帧
    pub sink_failures: u64,      // 录像输出失败
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub frames_recorded: u64,
}

/// 每秒打印一次统计
pub struct StatsReporter {
    interval: Duration,
    last: Instant,
    last_frames: u64,
}

impl Default for StatsReporter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl StatsReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
            last_frames: 0,
        }
    }

    pub fn tick(&mut self, stats: &PipelineStats, recording: bool) {
        let elapsed = self.last.elapsed();
        if elapsed < self.interval {
            return;
        }

        let fps = (stats.frames - self.last_frames) as f64 / elapsed.as_secs_f64();
        info!(
            "📺 帧统计: {:.1}fps | 总帧{} | 有人{} | 解码失败{} | 推理失败{} | 录像{}段 {}",
            fps,
            stats.frames,
            stats.person_frames,
            stats.decode_failures,
            stats.inference_failures,
            stats.sessions_started,
            if recording { "🔴" } else { "⚪" }
        );

        self.last = Instant::now();
        self.last_frames = stats.frames;
    }
}
