// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测器 (Detector)
//! 职责: RGB帧 → 目标检测 → DetectionRecord 列表

use crate::error::SentinelResult;
use image::RgbImage;

use super::types::DetectionRecord;

/// 目标检测接口
///
/// 推理失败时返回 `SentinelError::Inference`,由流水线按"本帧无人"处理
pub trait ObjectDetector {
    fn detect(&mut self, image: &RgbImage) -> SentinelResult<Vec<DetectionRecord>>;
}

/// `detection_out` 每行7个值: [image_id, label, confidence, x1, y1, x2, y2]
pub const SSD_ROW_LEN: usize = 7;

/// 解析 SSD 风格的检测输出
///
/// 类别和置信度取自同一行的固定位置 (label=1, confidence=2);
/// 非法行 (负类别、非有限值、不完整的行) 直接跳过
pub fn parse_ssd_rows(data: &[f32]) -> Vec<DetectionRecord> {
    data.chunks_exact(SSD_ROW_LEN)
        .filter_map(|row| {
            let (label, confidence) = (row[1], row[2]);
            if !label.is_finite() || !confidence.is_finite() || label < 0.0 {
                return None;
            }
            Some(DetectionRecord::new(label as u32, confidence))
        })
        .collect()
}

#[cfg(feature = "onnx")]
pub use self::onnx::{MobileNetSsd, SsdConfig};

#[cfg(feature = "onnx")]
mod onnx {
    use super::{parse_ssd_rows, ObjectDetector};
    use crate::detection::types::{DetectionRecord, SSD_INPUT_SIZE};
    use crate::error::{SentinelError, SentinelResult};
    use image::{imageops, RgbImage};
    use ndarray::Array4;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Tensor;
    use std::path::Path;
    use std::time::Instant;
    use tracing::{debug, info};

    /// MobileNet-SSD 模型参数
    #[derive(Clone, Debug)]
    pub struct SsdConfig {
        pub model_path: String,
        pub input_name: String,
        pub output_name: String,
        pub input_size: u32,
        pub mean: f32,  // 减均值
        pub scale: f32, // 乘系数: (p - 127.5) / 127.5 → [-1, 1]
    }

    impl Default for SsdConfig {
        fn default() -> Self {
            Self {
                model_path: "models/MobileNetSSD.onnx".to_string(),
                input_name: "data".to_string(),
                output_name: "detection_out".to_string(),
                input_size: SSD_INPUT_SIZE,
                mean: 127.5,
                scale: 1.0 / 127.5,
            }
        }
    }

    /// 基于 ONNX Runtime 的 MobileNet-SSD 检测器
    pub struct MobileNetSsd {
        session: Session,
        config: SsdConfig,

        // 统计
        count: u64,
        total_ms: f64,
    }

    impl MobileNetSsd {
        pub fn new(config: SsdConfig) -> SentinelResult<Self> {
            if !Path::new(&config.model_path).exists() {
                return Err(SentinelError::Inference(format!(
                    "模型文件不存在: {}",
                    config.model_path
                )));
            }

            let session = Session::builder()
                .map_err(|e| SentinelError::Inference(format!("创建会话失败: {}", e)))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| SentinelError::Inference(format!("设置优化级别失败: {}", e)))?
                .commit_from_file(&config.model_path)
                .map_err(|e| SentinelError::Inference(format!("加载模型失败: {}", e)))?;

            info!(
                "✅ 检测模型加载成功: {} (输入 {} → 输出 {})",
                config.model_path, config.input_name, config.output_name
            );

            Ok(Self {
                session,
                config,
                count: 0,
                total_ms: 0.0,
            })
        }

        /// RGB帧 → NCHW张量
        fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
            let size = self.config.input_size;
            let resized = imageops::resize(image, size, size, imageops::FilterType::Triangle);
            let (mean, scale) = (self.config.mean, self.config.scale);

            Array4::from_shape_fn((1, 3, size as usize, size as usize), |(_, c, y, x)| {
                let p = resized.get_pixel(x as u32, y as u32)[c] as f32;
                (p - mean) * scale
            })
        }
    }

    impl ObjectDetector for MobileNetSsd {
        fn detect(&mut self, image: &RgbImage) -> SentinelResult<Vec<DetectionRecord>> {
            let start = Instant::now();

            let input = Tensor::from_array(self.preprocess(image))
                .map_err(|e| SentinelError::Inference(format!("创建输入张量失败: {}", e)))?;

            let outputs = self
                .session
                .run(ort::inputs![self.config.input_name.as_str() => input])
                .map_err(|e| SentinelError::Inference(format!("推理失败: {}", e)))?;

            let output = outputs.get(self.config.output_name.as_str()).ok_or_else(|| {
                SentinelError::Inference(format!("缺少输出 '{}'", self.config.output_name))
            })?;
            let (_, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| SentinelError::Inference(format!("读取输出失败: {}", e)))?;

            let records = parse_ssd_rows(data);

            let inference_ms = start.elapsed().as_secs_f64() * 1000.0;
            self.count += 1;
            self.total_ms += inference_ms;
            debug!(
                "🔍 推理 #{}: {} 个候选, {:.1}ms (平均 {:.1}ms)",
                self.count,
                records.len(),
                inference_ms,
                self.total_ms / self.count as f64
            );

            Ok(records)
        }
    }
}
