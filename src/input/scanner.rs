// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// JPEG帧边界扫描
/// JPEG frame boundary scanner

/// 帧起始标记 (SOI)
pub const START_MARKER: [u8; 2] = [0xFF, 0xD8];
/// 帧结束标记 (EOI)
pub const END_MARKER: [u8; 2] = [0xFF, 0xD9];

/// 扫描结果: 两个标记各自的首次出现位置 (标记首字节下标)
///
/// `end` 与 `start` 相互独立,都从下标0开始查找,不保证 `end > start`,
/// 调用方负责校验
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameBounds {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl FrameBounds {
    /// 起止标记都存在且顺序正确时,返回完整帧的字节范围 (含结束标记两字节)
    pub fn frame_range(&self) -> Option<std::ops::Range<usize>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end > start => Some(start..end + END_MARKER.len()),
            _ => None,
        }
    }
}

/// 单次线性扫描,两个标记都找到后立即返回
pub fn scan(buf: &[u8]) -> FrameBounds {
    let mut bounds = FrameBounds::default();

    for (i, pair) in buf.windows(2).enumerate() {
        if pair[0] != 0xFF {
            continue;
        }
        if bounds.start.is_none() && pair[1] == START_MARKER[1] {
            bounds.start = Some(i);
        } else if bounds.end.is_none() && pair[1] == END_MARKER[1] {
            bounds.end = Some(i);
        }
        if bounds.start.is_some() && bounds.end.is_some() {
            break;
        }
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_buffers() {
        assert_eq!(scan(&[]), FrameBounds::default());
        assert_eq!(scan(&[0xFF]), FrameBounds::default());
        assert_eq!(scan(&[0xD8]), FrameBounds::default());
    }

    #[test]
    fn test_finds_both_markers() {
        let buf = [0xFF, 0xD8, b'A', b'A', b'A', 0xFF, 0xD9];
        let bounds = scan(&buf);
        assert_eq!(bounds.start, Some(0));
        assert_eq!(bounds.end, Some(5));
        assert_eq!(bounds.frame_range(), Some(0..7));
    }

    #[test]
    fn test_end_before_start_is_reported_as_is() {
        // 结束标记在前: 扫描器不做校验
        let buf = [0xFF, 0xD9, b'x', 0xFF, 0xD8, b'y'];
        let bounds = scan(&buf);
        assert_eq!(bounds.start, Some(3));
        assert_eq!(bounds.end, Some(0));
        assert_eq!(bounds.frame_range(), None);
    }

    #[test]
    fn test_earliest_markers_win() {
        let buf = [0xFF, 0xD8, 0xFF, 0xD8, 0xFF, 0xD9, 0xFF, 0xD9];
        let bounds = scan(&buf);
        assert_eq!(bounds.start, Some(0));
        assert_eq!(bounds.end, Some(4));
    }

    #[test]
    fn test_missing_end_marker() {
        let buf = [b'g', 0xFF, 0xD8, 0x00, 0xFF];
        let bounds = scan(&buf);
        assert_eq!(bounds.start, Some(1));
        assert_eq!(bounds.end, None);
    }

    #[test]
    fn test_ff_runs() {
        // 连续0xFF填充不影响定位
        let buf = [0xFF, 0xFF, 0xFF, 0xD8, 0xFF, 0xFF, 0xD9];
        let bounds = scan(&buf);
        assert_eq!(bounds.start, Some(2));
        assert_eq!(bounds.end, Some(5));
    }
}
