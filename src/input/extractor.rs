// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// MJPEG流帧提取器 (有状态解复用)
/// MJPEG stream frame extractor
///
/// 传输层的数据块与帧边界无关: 一个块可能包含多帧、半帧或标记的一半。
/// 提取器把块追加到残留缓冲区,反复扫描并切出完整帧,剩余字节留到下一次。
/// 错位/损坏的数据直接丢弃并重新同步,永远不返回错误。
use super::scanner::{self, END_MARKER, START_MARKER};
use tracing::{debug, warn};

/// 单帧最大字节数默认值 (超出视为失控数据)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// 完整的JPEG帧 (提取线程 → 解码)
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub seq: u64, // 帧序号 (会话内单调递增)
    pub data: Vec<u8>,
}

impl EncodedFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for EncodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedFrame")
            .field("seq", &self.seq)
            .field("len", &self.data.len())
            .finish()
    }
}

pub struct FrameExtractor {
    buffer: Vec<u8>, // 残留缓冲区
    max_frame_bytes: usize,
    next_seq: u64,
    skipping: bool, // 正在丢弃超长帧,直到下一个结束标记

    // 统计
    frames_emitted: u64,
    discarded_bytes: u64,
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameExtractor {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_bytes: max_frame_bytes.max(START_MARKER.len() + END_MARKER.len()),
            next_seq: 0,
            skipping: false,
            frames_emitted: 0,
            discarded_bytes: 0,
        }
    }

    /// 追加一个数据块,返回本次切出的所有完整帧 (可能为空)
    pub fn submit(&mut self, chunk: &[u8]) -> Vec<EncodedFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();

        // 每轮循环至少缩短缓冲区1字节,上限由缓冲区长度决定
        let max_iterations = self.buffer.len() + 1;
        let mut iterations = 0;

        loop {
            if iterations >= max_iterations {
                warn!(
                    "⚠️ 帧提取循环达到上限 {} 次, 残留 {} 字节",
                    max_iterations,
                    self.buffer.len()
                );
                break;
            }
            iterations += 1;

            // 超长帧: 丢弃到结束标记为止,与整帧到达时的处理一致
            if self.skipping {
                match scanner::scan(&self.buffer).end {
                    Some(end) => {
                        self.discard_front(end + END_MARKER.len());
                        self.skipping = false;
                        continue;
                    }
                    None => {
                        self.discard_noise();
                        break;
                    }
                }
            }

            let bounds = scanner::scan(&self.buffer);
            match (bounds.start, bounds.end) {
                // 完整帧: 切出 [start, end+1],保留其后的字节
                (Some(start), Some(end)) if end > start => {
                    let frame_end = end + END_MARKER.len();
                    if frame_end - start > self.max_frame_bytes {
                        warn!(
                            "⚠️ 帧长度 {} 超过上限 {} 字节, 丢弃",
                            frame_end - start,
                            self.max_frame_bytes
                        );
                        self.discard_front(frame_end);
                        continue;
                    }
                    let data = self.buffer[start..frame_end].to_vec();
                    self.discarded_bytes += start as u64;
                    self.buffer.drain(..frame_end);

                    frames.push(EncodedFrame {
                        seq: self.next_seq,
                        data,
                    });
                    self.next_seq += 1;
                    self.frames_emitted += 1;
                }
                // 结束标记出现在起始标记之前: 起始标记前的字节全部是噪声
                (Some(start), Some(end)) => {
                    debug!("帧标记错位 (end={} start={}), 丢弃 {} 字节", end, start, start);
                    self.discard_front(start);
                }
                // 帧尚未结束: 丢掉起始标记之前的噪声,等待更多数据
                (Some(start), None) => {
                    self.discard_front(start);
                    if self.buffer.len() <= self.max_frame_bytes {
                        break;
                    }
                    warn!(
                        "⚠️ 未结束的帧超过 {} 字节, 丢弃至下一个结束标记",
                        self.max_frame_bytes
                    );
                    self.skipping = true;
                }
                // 没有起始标记: 除了可能是半个标记的末尾0xFF,其余都是噪声
                (None, _) => {
                    self.discard_noise();
                    break;
                }
            }
        }

        frames
    }

    /// 会话结束: 丢弃残留数据 (不输出半帧)
    pub fn reset(&mut self) {
        if !self.buffer.is_empty() {
            debug!("会话结束, 丢弃残留 {} 字节", self.buffer.len());
        }
        self.discarded_bytes += self.buffer.len() as u64;
        self.buffer.clear();
        self.skipping = false;
    }

    pub fn residual_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    fn discard_front(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.discarded_bytes += n as u64;
        self.buffer.drain(..n);
    }

    fn discard_noise(&mut self) {
        let keep = usize::from(self.buffer.last() == Some(&START_MARKER[0]));
        let drop = self.buffer.len() - keep;
        self.discard_front(drop);
    }
}
