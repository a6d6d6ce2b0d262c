// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// JPEG帧解码
/// JPEG frame decoder
use super::extractor::EncodedFrame;
use crate::error::{SentinelError, SentinelResult};
use image::{ImageFormat, RgbImage};

/// 图像解码接口: 编码帧 → RGB像素
pub trait FrameDecoder {
    fn decode(&mut self, frame: &EncodedFrame) -> SentinelResult<RgbImage>;
}

/// 基于 image crate 的JPEG解码器
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegDecoder;

impl FrameDecoder for JpegDecoder {
    fn decode(&mut self, frame: &EncodedFrame) -> SentinelResult<RgbImage> {
        let img = image::load_from_memory_with_format(frame.as_bytes(), ImageFormat::Jpeg)
            .map_err(|e| SentinelError::Decode(format!("帧 #{}: {}", frame.seq, e)))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(SentinelError::Decode(format!("帧 #{}: 空图像", frame.seq)));
        }
        Ok(img.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::Rgb;

    fn encode(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 90)
            .encode_image(img)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_roundtrip_dimensions() {
        let img = RgbImage::from_pixel(32, 24, Rgb([200, 30, 30]));
        let frame = EncodedFrame {
            seq: 7,
            data: encode(&img),
        };
        let decoded = JpegDecoder.decode(&frame).unwrap();
        assert_eq!(decoded.dimensions(), (32, 24));
        // 有损压缩: 只检查大致颜色
        let px = decoded.get_pixel(16, 12);
        assert!(px[0] > 150 && px[1] < 80);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let frame = EncodedFrame {
            seq: 3,
            data: vec![0xFF, 0xD8, b'n', b'o', 0xFF, 0xD9],
        };
        let err = JpegDecoder.decode(&frame).unwrap_err();
        assert!(matches!(err, SentinelError::Decode(_)));
        assert!(err.to_string().contains("#3"));
    }
}
