// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频流传输层: 产生与帧边界无关的字节块
/// Stream transport: produces boundary-unaware byte chunks
use crate::error::{SentinelError, SentinelResult};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// 默认单次读取大小
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// 字节块来源
///
/// `Ok(None)` 表示流正常结束;`Err` 表示传输中断。两者都结束当前会话。
pub trait ChunkSource {
    fn next_chunk(&mut self) -> SentinelResult<Option<Vec<u8>>>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn next_chunk(&mut self) -> SentinelResult<Option<Vec<u8>>> {
        (**self).next_chunk()
    }
}

/// 输入源
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    Http(String),  // MJPEG over HTTP (multipart/x-mixed-replace)
    File(PathBuf), // 录制好的MJPEG字节流回放
}

impl InputSource {
    /// 根据地址推断输入源类型
    pub fn parse(address: &str) -> Self {
        let lower = address.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            InputSource::Http(address.to_string())
        } else {
            InputSource::File(PathBuf::from(address))
        }
    }

    pub fn name(&self) -> String {
        match self {
            InputSource::Http(url) => url.clone(),
            InputSource::File(path) => path.display().to_string(),
        }
    }

    /// 打开输入源
    pub fn open(
        &self,
        chunk_size: usize,
        read_timeout: Duration,
    ) -> SentinelResult<Box<dyn ChunkSource + Send>> {
        match self {
            InputSource::Http(url) => Ok(Box::new(HttpMjpegSource::connect(
                url,
                chunk_size,
                read_timeout,
            )?)),
            InputSource::File(path) => {
                let file = File::open(path).map_err(|e| {
                    SentinelError::Transport(format!("无法打开 {}: {}", path.display(), e))
                })?;
                info!("📂 回放文件: {}", path.display());
                Ok(Box::new(ReaderSource::new(file, chunk_size)))
            }
        }
    }
}

/// 从任意 `Read` 按固定大小读取
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0; chunk_size.max(1)],
        }
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> SentinelResult<Option<Vec<u8>>> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(self.buf[..n].to_vec())),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Err(SentinelError::Transport(format!("读取超时: {}", e)))
                }
                Err(e) => return Err(SentinelError::Transport(format!("读取失败: {}", e))),
            }
        }
    }
}

/// HTTP MJPEG 拉流
pub struct HttpMjpegSource {
    inner: ReaderSource<Box<dyn Read + Send + Sync + 'static>>,
}

impl HttpMjpegSource {
    pub fn connect(url: &str, chunk_size: usize, read_timeout: Duration) -> SentinelResult<Self> {
        info!("📹 连接视频流: {}", url);

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(read_timeout)
            .timeout_read(read_timeout)
            .build();

        let response = agent
            .get(url)
            .set("Accept", "multipart/x-mixed-replace")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    SentinelError::Transport(format!("HTTP状态码 {}: {}", code, url))
                }
                other => SentinelError::Transport(format!("连接失败: {}", other)),
            })?;

        info!(
            "✅ 视频流已连接 (Content-Type: {})",
            response.content_type()
        );

        Ok(Self {
            inner: ReaderSource::new(response.into_reader(), chunk_size),
        })
    }
}

impl ChunkSource for HttpMjpegSource {
    fn next_chunk(&mut self) -> SentinelResult<Option<Vec<u8>>> {
        self.inner.next_chunk()
    }
}
