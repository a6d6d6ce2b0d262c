// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测系统 (Detection System)
///
/// - Detector:   目标检测 (MobileNet-SSD / 可替换实现)
/// - Classifier: 检测记录 → 本帧是否有人
pub mod classifier;
pub mod detector;
pub mod types;

pub use classifier::{classify, DetectionClassifier};
pub use detector::ObjectDetector;
#[cfg(feature = "onnx")]
pub use detector::{MobileNetSsd, SsdConfig};
pub use types::{DetectionRecord, VOC_PERSON_CLASS_ID};
