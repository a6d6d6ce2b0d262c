// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 录像控制状态机 (Recording Controller)
//!
//! ```text
//!            有人
//!   Idle ──────────────▶ Recording ──┐ 每帧写入
//!    ▲                      │  ▲     │
//!    │  无人 且 距开始≥冷却时间 │  └─────┘
//!    └──────────────────────┘
//! ```
//!
//! 冷却时间从录像开始时刻计算,而不是从最后一次检测到人计算:
//! 一段录像至少持续 `cooldown`,之后第一个"无人"帧即结束录像。

use super::sink::{FrameSize, VideoSink, VideoWriter};
use crate::error::SentinelResult;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// 时间戳占位符
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";
/// 会话序号占位符
pub const SEQ_PLACEHOLDER: &str = "{seq}";

/// 录像参数
#[derive(Clone, Debug, PartialEq)]
pub struct RecorderConfig {
    pub cooldown: Duration,
    pub frame_rate: f64,
    pub output_template: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(5),
            frame_rate: 20.0,
            output_template: "output/{timestamp}.mp4".to_string(),
        }
    }
}

/// 单帧处理后的状态变化
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// 保持空闲,未写入
    Idle,
    /// 开始新录像 (本帧已写入)
    Started { path: PathBuf },
    /// 录像中 (本帧已写入)
    Recording,
    /// 录像结束 (本帧已写入后关闭)
    Stopped {
        path: PathBuf,
        frames: u64,
        duration: Duration,
    },
}

/// 一段正在进行的录像
pub struct RecordingSession<W> {
    started_at: Instant,
    path: PathBuf,
    writer: W,
    frames_written: u64,
}

impl<W> RecordingSession<W> {
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

enum State<W> {
    Idle,
    Recording(RecordingSession<W>),
}

pub struct RecordingController<S: VideoSink> {
    sink: S,
    config: RecorderConfig,
    state: State<S::Writer>,

    // 统计
    sessions_started: u64,
    sessions_completed: u64,
    frames_written: u64,
}

impl<S: VideoSink> RecordingController<S> {
    pub fn new(sink: S, config: RecorderConfig) -> Self {
        Self {
            sink,
            config,
            state: State::Idle,
            sessions_started: 0,
            sessions_completed: 0,
            frames_written: 0,
        }
    }

    /// 处理一帧的检测结果
    ///
    /// 录像输出出错时强制回到 Idle (尽力释放资源) 并返回错误,下一帧照常从 Idle 开始判断
    pub fn on_frame(
        &mut self,
        frame: &RgbImage,
        person_detected: bool,
        now: Instant,
    ) -> SentinelResult<Transition> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => {
                if !person_detected {
                    return Ok(Transition::Idle);
                }
                let session = self.start(frame, now)?;
                let path = session.path.clone();
                self.state = State::Recording(session);
                Ok(Transition::Started { path })
            }
            State::Recording(mut session) => {
                if let Err(e) = session.writer.write(frame) {
                    error!("❌ 写入录像 {} 失败: {}", session.path.display(), e);
                    abort(session);
                    return Err(e);
                }
                session.frames_written += 1;
                self.frames_written += 1;

                let elapsed = now.saturating_duration_since(session.started_at);
                if !person_detected && elapsed >= self.config.cooldown {
                    return self.stop(session, now);
                }

                self.state = State::Recording(session);
                Ok(Transition::Recording)
            }
        }
    }

    /// 会话结束 (正常结束/取消/断流): 关闭尚未结束的录像
    pub fn finish(&mut self, now: Instant) -> SentinelResult<Option<Transition>> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => Ok(None),
            State::Recording(session) => {
                info!("⏹️ 会话结束, 关闭进行中的录像");
                self.stop(session, now).map(Some)
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording(_))
    }

    pub fn session(&self) -> Option<&RecordingSession<S::Writer>> {
        match &self.state {
            State::Recording(session) => Some(session),
            State::Idle => None,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    pub fn sessions_completed(&self) -> u64 {
        self.sessions_completed
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn start(&mut self, frame: &RgbImage, now: Instant) -> SentinelResult<RecordingSession<S::Writer>> {
        let path = self.next_output_path();
        let size = FrameSize::of(frame);

        let mut writer = self
            .sink
            .open(&path, self.config.frame_rate, size)
            .map_err(|e| {
                error!("❌ 打开录像 {} 失败: {}", path.display(), e);
                e
            })?;

        if let Err(e) = writer.write(frame) {
            error!("❌ 写入首帧失败: {}", e);
            let _ = writer.finish();
            return Err(e);
        }

        self.sessions_started += 1;
        self.frames_written += 1;
        info!("🔴 开始录像: {} ({})", path.display(), size);

        Ok(RecordingSession {
            started_at: now,
            path,
            writer,
            frames_written: 1,
        })
    }

    fn stop(
        &mut self,
        mut session: RecordingSession<S::Writer>,
        now: Instant,
    ) -> SentinelResult<Transition> {
        let duration = now.saturating_duration_since(session.started_at);
        session.writer.finish()?;
        self.sessions_completed += 1;
        info!(
            "⏹️ 停止录像: {} ({} 帧, {:.1}s)",
            session.path.display(),
            session.frames_written,
            duration.as_secs_f64()
        );
        Ok(Transition::Stopped {
            path: session.path,
            frames: session.frames_written,
            duration,
        })
    }

    /// 渲染输出路径;同名文件已存在时追加序号
    fn next_output_path(&self) -> PathBuf {
        let rendered = render_template(
            &self.config.output_template,
            &crate::gen_time_string(""),
            self.sessions_started,
        );
        let base = PathBuf::from(rendered);
        if !base.exists() {
            return base;
        }

        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = base
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let free = (1..)
            .map(|n| base.with_file_name(format!("{}_{}{}", stem, n, ext)))
            .find(|p| !p.exists());
        free.unwrap_or(base)
    }
}

impl<S: VideoSink> Drop for RecordingController<S> {
    fn drop(&mut self) {
        if let State::Recording(session) = std::mem::replace(&mut self.state, State::Idle) {
            warn!("⚠️ 控制器销毁时录像仍在进行: {}", session.path.display());
            abort(session);
        }
    }
}

/// 异常路径: 尽力关闭,忽略收尾错误
fn abort<W: VideoWriter>(mut session: RecordingSession<W>) {
    if let Err(e) = session.writer.finish() {
        warn!("⚠️ 释放录像 {} 失败: {}", session.path.display(), e);
    }
}

/// 替换模板中的 `{timestamp}` 与 `{seq}`
pub fn render_template(template: &str, timestamp: &str, seq: u64) -> String {
    template
        .replace(TIMESTAMP_PLACEHOLDER, timestamp)
        .replace(SEQ_PLACEHOLDER, &seq.to_string())
}
