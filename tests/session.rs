// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

mod common;

use common::*;
use sentinel_recorder::input::{ChunkSource, ReaderSource};
use sentinel_recorder::{spawn_session, SentinelError, SentinelResult};
use std::io::Cursor;
use std::thread;
use std::time::Duration;

/// 无限输出有人帧的摄像头
struct EndlessCamera;

impl ChunkSource for EndlessCamera {
    fn next_chunk(&mut self) -> SentinelResult<Option<Vec<u8>>> {
        thread::sleep(Duration::from_millis(5));
        Ok(Some(frame(PERSON)))
    }
}

/// 先送出若干字节块,然后断流
struct DroppingCamera {
    chunks: Vec<Vec<u8>>,
}

impl ChunkSource for DroppingCamera {
    fn next_chunk(&mut self) -> SentinelResult<Option<Vec<u8>>> {
        if self.chunks.is_empty() {
            return Err(SentinelError::Transport("connection reset".into()));
        }
        Ok(Some(self.chunks.remove(0)))
    }
}

#[test]
fn test_session_runs_to_end_of_stream() {
    let (pipeline, _decoder, sink, _clock) = pipeline();
    let source = ReaderSource::new(Cursor::new(frames(&[EMPTY, PERSON, EMPTY])), 4);

    let session = spawn_session("replay", source, pipeline, 2).unwrap();
    assert_eq!(session.name(), "replay");
    let stats = session.join().unwrap();

    assert_eq!(stats.frames, 3);
    assert_eq!(stats.sessions_started, 1);
    assert_eq!(stats.sessions_completed, 1);
    assert_eq!(sink.log().finished, 1);
}

#[test]
fn test_transport_error_ends_session_cleanly() {
    let (pipeline, _decoder, sink, _clock) = pipeline();
    let mut half = frame(EMPTY);
    half.truncate(3);
    let source = DroppingCamera {
        chunks: vec![frame(PERSON), frame(PERSON), half],
    };

    let stats = spawn_session("flaky", source, pipeline, 8)
        .unwrap()
        .join()
        .unwrap();

    // 半帧不会被交付
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.frames_recorded, 2);
    let log = sink.log();
    assert_eq!(log.opened.len(), 1);
    assert_eq!(log.finished, 1);
}

#[test]
fn test_stop_handle_cancels_session() {
    let (pipeline, _decoder, sink, _clock) = pipeline();

    let session = spawn_session("live", EndlessCamera, pipeline, 4).unwrap();
    let stop = session.stop_handle();
    thread::sleep(Duration::from_millis(100));
    stop.stop();
    assert!(stop.is_stopped());

    let stats = session.join().unwrap();
    assert!(stats.frames > 0);
    assert_eq!(stats.sessions_started, 1);
    assert_eq!(stats.sessions_completed, 1);

    let log = sink.log();
    assert_eq!(log.opened.len(), 1);
    assert_eq!(log.finished, 1);
}

#[test]
fn test_sessions_are_isolated() {
    let (first, _, first_sink, _) = pipeline();
    let (second, _, second_sink, _) = pipeline();

    let a = spawn_session(
        "cam-a",
        ReaderSource::new(Cursor::new(frames(&[PERSON, PERSON])), 5),
        first,
        4,
    )
    .unwrap();
    let b = spawn_session(
        "cam-b",
        ReaderSource::new(Cursor::new(frames(&[EMPTY, EMPTY, EMPTY])), 5),
        second,
        4,
    )
    .unwrap();

    let stats_a = a.join().unwrap();
    let stats_b = b.join().unwrap();
    assert_eq!(stats_a.sessions_started, 1);
    assert_eq!(stats_b.sessions_started, 0);
    assert_eq!(first_sink.log().writes, 2);
    assert_eq!(second_sink.log().writes, 0);
}
