// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

// 错误处理模块
//
// 帧数据损坏 (起止标记错位) 不在此列: 由 FrameExtractor 内部丢弃并重新同步

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    /// JPEG解码失败: 跳过该帧
    #[error("解码错误: {0}")]
    Decode(String),

    /// 推理失败: 该帧按"无人"处理
    #[error("推理错误: {0}")]
    Inference(String),

    /// 录像输出失败: 强制结束当前录像
    #[error("录像输出错误: {0}")]
    Sink(String),

    /// 视频流传输失败: 会话结束
    #[error("传输错误: {0}")]
    Transport(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SentinelResult<T> = Result<T, SentinelError>;
