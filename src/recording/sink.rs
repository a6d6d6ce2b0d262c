// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

// 录像输出模块
//
// VideoSink 负责打开输出,VideoWriter 负责逐帧写入与收尾。
// FFmpeg 实现: 启动 ffmpeg 子进程,通过 stdin 写入 rgb24 原始帧

use crate::error::{SentinelError, SentinelResult};
use image::RgbImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use tracing::{debug, info, warn};

/// 帧尺寸
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn of(frame: &RgbImage) -> Self {
        let (width, height) = frame.dimensions();
        Self { width, height }
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 已打开的录像输出
///
/// `finish` 可重复调用;实现者应在 Drop 中尽力完成收尾,保证资源释放
pub trait VideoWriter {
    fn write(&mut self, frame: &RgbImage) -> SentinelResult<()>;
    fn finish(&mut self) -> SentinelResult<()>;
}

/// 录像输出工厂
pub trait VideoSink {
    type Writer: VideoWriter;

    fn open(&mut self, path: &Path, frame_rate: f64, size: FrameSize) -> SentinelResult<Self::Writer>;
}

/// ffmpeg 子进程编码器
#[derive(Clone, Debug)]
pub struct FfmpegSink {
    ffmpeg_path: String,
    codec: String,
}

impl Default for FfmpegSink {
    fn default() -> Self {
        Self::new("ffmpeg", "mpeg4")
    }
}

impl FfmpegSink {
    pub fn new(ffmpeg_path: &str, codec: &str) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.to_string(),
            codec: codec.to_string(),
        }
    }

    fn command(&self, path: &Path, frame_rate: f64, size: FrameSize) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &size.to_string()])
            .args(["-r", &frame_rate.to_string()])
            .args(["-i", "-", "-an"])
            .args(["-c:v", &self.codec, "-pix_fmt", "yuv420p"]);
        if self.codec == "mpeg4" {
            cmd.args(["-vtag", "xvid", "-q:v", "5"]);
        }
        cmd.arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl VideoSink for FfmpegSink {
    type Writer = FfmpegWriter;

    fn open(&mut self, path: &Path, frame_rate: f64, size: FrameSize) -> SentinelResult<FfmpegWriter> {
        if size.width == 0 || size.height == 0 {
            return Err(SentinelError::Sink(format!("非法帧尺寸 {}", size)));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SentinelError::Sink(format!("创建目录 {} 失败: {}", parent.display(), e)))?;
        }

        let mut child = self
            .command(path, frame_rate, size)
            .spawn()
            .map_err(|e| SentinelError::Sink(format!("启动 {} 失败: {}", self.ffmpeg_path, e)))?;

        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SentinelError::Sink("无法获取 ffmpeg 输入管道".into()));
            }
        };

        info!(
            "[FFMPEG] 编码器启动: {} ({} @ {}fps, {})",
            path.display(),
            size,
            frame_rate,
            self.codec
        );

        Ok(FfmpegWriter {
            child: Some(child),
            stdin: Some(stdin),
            size,
            path: path.to_path_buf(),
            frames: 0,
        })
    }
}

pub struct FfmpegWriter {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    size: FrameSize,
    path: PathBuf,
    frames: u64,
}

impl VideoWriter for FfmpegWriter {
    fn write(&mut self, frame: &RgbImage) -> SentinelResult<()> {
        let size = FrameSize::of(frame);
        if size != self.size {
            return Err(SentinelError::Sink(format!(
                "帧尺寸变化: {} → {}",
                self.size, size
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SentinelError::Sink("编码器已关闭".into()))?;
        stdin
            .write_all(frame.as_raw())
            .map_err(|e| SentinelError::Sink(format!("写入 ffmpeg 失败: {}", e)))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> SentinelResult<()> {
        // 关闭stdin → ffmpeg 收到EOF后写完文件尾
        drop(self.stdin.take());

        let child = match self.child.take() {
            Some(child) => child,
            None => return Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| SentinelError::Sink(format!("等待 ffmpeg 退出失败: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SentinelError::Sink(format!(
                "ffmpeg 退出异常 ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        debug!(
            "[FFMPEG] 编码完成: {} ({} 帧)",
            self.path.display(),
            self.frames
        );
        Ok(())
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(e) = self.finish() {
                warn!("⚠️ 关闭录像 {} 失败: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_frame_size() {
        let img = RgbImage::from_pixel(640, 480, Rgb([0, 0, 0]));
        let size = FrameSize::of(&img);
        assert_eq!(size, FrameSize { width: 640, height: 480 });
        assert_eq!(size.to_string(), "640x480");
    }

    #[test]
    fn test_command_line() {
        let sink = FfmpegSink::default();
        let cmd = sink.command(
            Path::new("output/clip.mp4"),
            20.0,
            FrameSize { width: 320, height: 240 },
        );
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.windows(2).any(|w| w[0] == "-s" && w[1] == "320x240"));
        assert!(args.windows(2).any(|w| w[0] == "-r" && w[1] == "20"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "mpeg4"));
        assert_eq!(args.last().map(String::as_str), Some("output/clip.mp4"));
    }

    #[test]
    fn test_missing_executable_is_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FfmpegSink::new("/nonexistent/bin/ffmpeg-sentinel", "mpeg4");
        let result = sink.open(
            &dir.path().join("clip.mp4"),
            20.0,
            FrameSize { width: 2, height: 2 },
        );
        assert!(matches!(result, Err(SentinelError::Sink(_))));
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut sink = FfmpegSink::default();
        let result = sink.open(Path::new("x.mp4"), 20.0, FrameSize { width: 0, height: 10 });
        assert!(matches!(result, Err(SentinelError::Sink(_))));
    }
}
