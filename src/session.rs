// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 会话线程 (Session Threads)
///
/// 每个摄像头会话两条独立线程,会话之间不共享任何可变状态:
/// 1. 采集线程: 从输入源读取字节块 → 有界队列
/// 2. 处理线程: 按到达顺序消费字节块 → Pipeline
///
/// 流结束、传输中断、主动停止都走同一条收尾路径 (`Pipeline::shutdown`)
use crate::detection::ObjectDetector;
use crate::error::{SentinelError, SentinelResult};
use crate::input::{ChunkSource, FrameDecoder};
use crate::pipeline::{Clock, Pipeline, PipelineStats};
use crate::recording::VideoSink;
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 处理线程检查停止标志的间隔
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 会话停止标志
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct SessionHandle {
    name: String,
    stop: StopHandle,
    acquisition: JoinHandle<()>,
    worker: JoinHandle<PipelineStats>,
}

impl SessionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// 请求停止会话 (不等待)
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// 等待会话结束,返回最终统计
    pub fn join(self) -> SentinelResult<PipelineStats> {
        let stats = self
            .worker
            .join()
            .map_err(|_| SentinelError::Transport(format!("会话 {} 处理线程异常退出", self.name)))?;

        // 采集线程可能阻塞在读取上,读超时或下一次发送失败时自行退出
        if self.acquisition.is_finished() {
            let _ = self.acquisition.join();
        } else {
            debug!("会话 {} 采集线程仍在等待数据, 不再等待", self.name);
        }
        Ok(stats)
    }
}

/// 启动一个会话
pub fn spawn_session<T, D, O, S, C>(
    name: &str,
    mut source: T,
    mut pipeline: Pipeline<D, O, S, C>,
    queue_capacity: usize,
) -> SentinelResult<SessionHandle>
where
    T: ChunkSource + Send + 'static,
    D: FrameDecoder + Send + 'static,
    O: ObjectDetector + Send + 'static,
    S: VideoSink + Send + 'static,
    S::Writer: Send + 'static,
    C: Clock + Send + 'static,
{
    let stop = StopHandle::new();
    let (tx, rx) = bounded::<Vec<u8>>(queue_capacity.max(1));

    // ========== 采集线程 ==========
    let acq_stop = stop.clone();
    let acq_name = name.to_string();
    let acquisition = thread::Builder::new()
        .name(format!("{}-acquisition", name))
        .spawn(move || {
            info!("🎬 采集线程启动: {}", acq_name);
            while !acq_stop.is_stopped() {
                match source.next_chunk() {
                    Ok(Some(chunk)) => {
                        if tx.send(chunk).is_err() {
                            break; // 处理线程已退出
                        }
                    }
                    Ok(None) => {
                        info!("📭 视频流结束: {}", acq_name);
                        break;
                    }
                    Err(e) => {
                        warn!("⚠️ 视频流中断: {}: {}", acq_name, e);
                        break;
                    }
                }
            }
            info!("❌ 采集线程退出: {}", acq_name);
        })?;

    // ========== 处理线程 ==========
    let worker_stop = stop.clone();
    let worker_name = name.to_string();
    let worker = thread::Builder::new()
        .name(format!("{}-pipeline", name))
        .spawn(move || {
            info!("🔍 处理线程启动: {}", worker_name);
            loop {
                if worker_stop.is_stopped() {
                    info!("🛑 会话已停止: {}", worker_name);
                    break;
                }
                match rx.recv_timeout(STOP_POLL_INTERVAL) {
                    Ok(chunk) => {
                        pipeline.process_chunk(&chunk);
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            // 丢弃队列中尚未处理的数据,不输出半帧
            drop(rx);
            pipeline.shutdown()
        })?;

    Ok(SessionHandle {
        name: name.to_string(),
        stop,
        acquisition,
        worker,
    })
}
