// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 数字卫兵 (Digital Sentinel)
///
/// 摄像头人员检测 + 自动录像
///
/// 系统架构:
/// 1. 采集线程: 读取 MJPEG 字节流 (独立工作线程)
/// 2. 处理线程: 帧提取 → 解码 → 检测 → 录像控制 (独立工作线程)
/// 3. 主线程:   等待会话结束
use anyhow::{Context, Result};
use clap::Parser;
use sentinel_recorder::detection::{MobileNetSsd, SsdConfig};
use sentinel_recorder::input::JpegDecoder;
use sentinel_recorder::logging::init_logging;
use sentinel_recorder::pipeline::{Pipeline, SystemClock};
use sentinel_recorder::recording::FfmpegSink;
use sentinel_recorder::{spawn_session, Args, SentinelConfig};
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, outcome) = SentinelConfig::load(&args.config);
    args.apply(&mut config);

    // 日志就绪后再输出配置加载结果
    let _guard = init_logging(config.log_level, config.log_dir.as_deref());
    outcome.report(&args.config);
    config.validate().context("配置无效")?;

    info!("🚀 数字卫兵系统启动");
    config.print_summary();

    // ========== 检测模型 ==========
    let detector = MobileNetSsd::new(SsdConfig {
        model_path: config.model_path.clone(),
        input_name: config.model_input.clone(),
        output_name: config.model_output.clone(),
        ..Default::default()
    })
    .with_context(|| format!("加载检测模型失败: {}", config.model_path))?;

    let sink = FfmpegSink::new(&config.ffmpeg_path, &config.video_codec);
    let pipeline = Pipeline::new(
        JpegDecoder,
        detector,
        sink,
        SystemClock,
        config.pipeline_config(),
    );

    // ========== 连接视频源 ==========
    let input = config.input_source();
    let source = input
        .open(config.chunk_size, config.read_timeout())
        .with_context(|| format!("打开视频源失败: {}", input.name()))?;

    let session = spawn_session(&input.name(), source, pipeline, config.queue_capacity)
        .context("启动会话失败")?;
    info!("✅ 系统就绪,开始监控...");

    let stats = session.join().context("会话异常结束")?;
    info!(
        "👋 退出: {} 帧, 检测到人 {} 帧, 录像 {} 段 ({} 帧)",
        stats.frames, stats.person_frames, stats.sessions_completed, stats.frames_recorded
    );
    Ok(())
}
