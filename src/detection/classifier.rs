// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 人员判定: 检测记录 → 本帧是否有人
use super::types::{DetectionRecord, VOC_PERSON_CLASS_ID};

/// 存在至少一条 `confidence > threshold` 且类别匹配的记录时返回 true
///
/// 遇到第一条满足条件的记录立即返回;置信度为 NaN 的记录永远不满足条件
pub fn classify(records: &[DetectionRecord], confidence_threshold: f32, target_class_id: u32) -> bool {
    records
        .iter()
        .any(|r| r.class_id == target_class_id && r.confidence > confidence_threshold)
}

/// 带配置的分类器
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionClassifier {
    pub confidence_threshold: f32,
    pub target_class_id: u32,
}

impl Default for DetectionClassifier {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            target_class_id: VOC_PERSON_CLASS_ID,
        }
    }
}

impl DetectionClassifier {
    pub fn new(confidence_threshold: f32, target_class_id: u32) -> Self {
        Self {
            confidence_threshold,
            target_class_id,
        }
    }

    pub fn classify(&self, records: &[DetectionRecord]) -> bool {
        classify(records, self.confidence_threshold, self.target_class_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_above_threshold() {
        let records = [DetectionRecord::new(15, 0.9)];
        assert!(classify(&records, 0.5, 15));
    }

    #[test]
    fn test_empty_records() {
        assert!(!classify(&[], 0.5, 15));
        assert!(!DetectionClassifier::default().classify(&[]));
    }

    #[test]
    fn test_threshold_is_strict() {
        let records = [DetectionRecord::new(15, 0.5)];
        assert!(!classify(&records, 0.5, 15));
    }

    #[test]
    fn test_other_classes_ignored() {
        // 高置信度的猫(8)和汽车(7)不算
        let records = [
            DetectionRecord::new(8, 0.99),
            DetectionRecord::new(7, 0.95),
            DetectionRecord::new(15, 0.2),
        ];
        assert!(!classify(&records, 0.5, 15));
    }

    #[test]
    fn test_order_independent() {
        let mut records = vec![
            DetectionRecord::new(3, 0.7),
            DetectionRecord::new(15, 0.6),
            DetectionRecord::new(15, 0.1),
        ];
        assert!(classify(&records, 0.5, 15));
        records.reverse();
        assert!(classify(&records, 0.5, 15));
    }

    #[test]
    fn test_nan_confidence_rejected() {
        let records = [DetectionRecord::new(15, f32::NAN)];
        assert!(!classify(&records, 0.5, 15));
    }

    #[test]
    fn test_configurable_target() {
        // YOLO/COCO 模型中 person 为 0
        let classifier = DetectionClassifier::new(0.25, 0);
        assert!(classifier.classify(&[DetectionRecord::new(0, 0.3)]));
        assert!(!classifier.classify(&[DetectionRecord::new(15, 0.9)]));
    }
}
