// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频输入系统 (Video Input System)
///
/// 负责从摄像头MJPEG流中恢复出完整的JPEG帧
/// - Transport: HTTP拉流 / 文件回放,产生字节块
/// - Scanner:   JPEG起止标记定位
/// - Extractor: 有状态解复用,块 → 完整帧
/// - Decoder:   JPEG → RGB像素
pub mod decoder;
pub mod extractor;
pub mod scanner;
pub mod transport;

pub use decoder::{FrameDecoder, JpegDecoder};
pub use extractor::{EncodedFrame, FrameExtractor, DEFAULT_MAX_FRAME_BYTES};
pub use scanner::{scan, FrameBounds};
pub use transport::{ChunkSource, HttpMjpegSource, InputSource, ReaderSource, DEFAULT_CHUNK_SIZE};
