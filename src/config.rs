// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 数字卫兵配置 - JSON文件 + 命令行覆盖

use crate::detection::{DetectionClassifier, VOC_PERSON_CLASS_ID};
use crate::error::{SentinelError, SentinelResult};
use crate::input::{InputSource, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FRAME_BYTES};
use crate::pipeline::PipelineConfig;
use crate::recording::RecorderConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "sentinel.json";

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 转换为 tracing 过滤器字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 数字卫兵参数配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SentinelConfig {
    // === 输入 ===
    pub stream_url: String,       // MJPEG地址 (http/https) 或本地文件
    pub chunk_size: usize,        // 每次读取字节数
    pub max_frame_bytes: usize,   // 单帧上限,超出视为失控数据
    pub read_timeout_secs: u64,   // 读超时 (超时 = 会话结束)
    pub queue_capacity: usize,    // 采集 → 处理 队列长度

    // === 检测 ===
    pub confidence_threshold: f32, // 置信度阈值 (严格大于)
    pub target_class_id: u32,      // 目标类别 (VOC: 15 = person)
    pub model_path: String,
    pub model_input: String,
    pub model_output: String,

    // === 录像 ===
    pub cooldown_secs: f64,      // 最短录像时长,从开始录像算起
    pub frame_rate: f64,
    pub output_template: String, // 支持 {timestamp} 与 {seq}
    pub ffmpeg_path: String,
    pub video_codec: String,

    // === 日志 ===
    pub log_level: LogLevel,
    pub log_dir: Option<PathBuf>,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            // 输入
            stream_url: "http://192.168.0.149:81/stream".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            read_timeout_secs: 10,
            queue_capacity: 64,

            // 检测
            confidence_threshold: 0.5,
            target_class_id: VOC_PERSON_CLASS_ID,
            model_path: "models/MobileNetSSD.onnx".to_string(),
            model_input: "data".to_string(),
            model_output: "detection_out".to_string(),

            // 录像
            cooldown_secs: 5.0,
            frame_rate: 20.0,
            output_template: "output/{timestamp}.mp4".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            video_codec: "mpeg4".to_string(),

            // 日志
            log_level: LogLevel::Info,
            log_dir: None,
        }
    }
}

impl SentinelConfig {
    /// 从JSON文件加载配置
    ///
    /// 文件不存在时写入默认配置; 解析失败时使用默认值。
    /// 加载过程不打日志 (此时日志系统可能尚未初始化),结果由 `LoadOutcome::report` 输出
    pub fn load(path: impl AsRef<Path>) -> (Self, LoadOutcome) {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => (config, LoadOutcome::Loaded),
                Err(e) => (Self::default(), LoadOutcome::Unparsable(e.into())),
            },
            Err(_) => {
                let config = Self::default();
                let outcome = match config.write_json(path) {
                    Ok(()) => LoadOutcome::Created,
                    Err(e) => LoadOutcome::SaveFailed(e),
                };
                (config, outcome)
            }
        }
    }

    /// 严格加载: 文件缺失或格式错误都返回错误
    pub fn from_file(path: impl AsRef<Path>) -> SentinelResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> SentinelResult<()> {
        let path = path.as_ref();
        self.write_json(path)?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    fn write_json(&self, path: &Path) -> SentinelResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> SentinelResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SentinelError::Config(format!(
                "confidence_threshold 必须在 [0, 1] 内: {}",
                self.confidence_threshold
            )));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(SentinelError::Config(format!(
                "frame_rate 必须大于 0: {}",
                self.frame_rate
            )));
        }
        if !(self.cooldown_secs.is_finite() && self.cooldown_secs >= 0.0) {
            return Err(SentinelError::Config(format!(
                "cooldown_secs 不能为负: {}",
                self.cooldown_secs
            )));
        }
        if Duration::try_from_secs_f64(self.cooldown_secs).is_err() {
            return Err(SentinelError::Config(format!(
                "cooldown_secs 超出范围: {}",
                self.cooldown_secs
            )));
        }
        // 文件名可以不含占位符: 同名文件由控制器追加序号
        if self.output_template.trim().is_empty() {
            return Err(SentinelError::Config("output_template 不能为空".into()));
        }
        if self.chunk_size == 0 {
            return Err(SentinelError::Config("chunk_size 不能为 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(SentinelError::Config("queue_capacity 不能为 0".into()));
        }
        if self.stream_url.trim().is_empty() {
            return Err(SentinelError::Config("stream_url 不能为空".into()));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn classifier(&self) -> DetectionClassifier {
        DetectionClassifier::new(self.confidence_threshold, self.target_class_id)
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            cooldown: self.cooldown(),
            frame_rate: self.frame_rate,
            output_template: self.output_template.clone(),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            classifier: self.classifier(),
            recorder: self.recorder_config(),
            max_frame_bytes: self.max_frame_bytes,
        }
    }

    pub fn input_source(&self) -> InputSource {
        InputSource::parse(&self.stream_url)
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️ 当前配置:");
        info!("  视频源: {}", self.stream_url);
        info!("  检测模型: {}", self.model_path);
        info!(
            "  检测阈值: {:.2} (类别 {})",
            self.confidence_threshold, self.target_class_id
        );
        info!("  冷却时间: {:.1}s", self.cooldown_secs);
        info!("  录像输出: {} @ {:.1}fps", self.output_template, self.frame_rate);
    }
}

/// 配置文件加载结果
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded,
    /// 文件不存在,已写入默认配置
    Created,
    /// 文件不存在,写入默认配置失败
    SaveFailed(SentinelError),
    /// 文件无法解析,使用默认值
    Unparsable(SentinelError),
}

impl LoadOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, LoadOutcome::Unparsable(_))
    }

    /// 日志系统就绪后输出加载结果
    pub fn report(&self, path: &Path) {
        match self {
            LoadOutcome::Loaded => info!("✅ 配置已从 {} 加载", path.display()),
            LoadOutcome::Created => info!("📝 配置文件不存在, 已创建默认配置: {}", path.display()),
            LoadOutcome::SaveFailed(e) => warn!("❌ 保存默认配置 {} 失败: {}", path.display(), e),
            LoadOutcome::Unparsable(e) => {
                warn!("⚠️ 配置文件 {} 解析失败: {}, 使用默认值", path.display(), e)
            }
        }
    }
}

/// 数字卫兵参数
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "数字卫兵 - 人员检测自动录像", long_about = None)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// MJPEG流地址或本地文件
    #[arg(short = 'u', long)]
    pub stream_url: Option<String>,

    /// 检测模型
    #[arg(short, long)]
    pub model: Option<String>,

    /// 置信度阈值
    #[arg(long)]
    pub confidence: Option<f32>,

    /// 冷却时间 (秒)
    #[arg(long)]
    pub cooldown: Option<f64>,

    /// 录像输出模板
    #[arg(short, long)]
    pub output: Option<String>,

    /// 录像帧率
    #[arg(long)]
    pub fps: Option<f64>,

    /// 日志级别
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// 日志目录 (不指定则只输出到控制台)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Args {
    /// 命令行参数覆盖配置文件
    pub fn apply(&self, config: &mut SentinelConfig) {
        if let Some(url) = &self.stream_url {
            config.stream_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(conf) = self.confidence {
            config.confidence_threshold = conf;
        }
        if let Some(cooldown) = self.cooldown {
            config.cooldown_secs = cooldown;
        }
        if let Some(output) = &self.output {
            config.output_template = output.clone();
        }
        if let Some(fps) = self.fps {
            config.frame_rate = fps;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }
    }
}
