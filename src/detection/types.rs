// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测系统数据结构定义
/// Data structures for the detection system

// ========== 公共常量 ==========

/// MobileNet-SSD (VOC 21类) 中 "person" 的类别编号
pub const VOC_PERSON_CLASS_ID: u32 = 15;

/// MobileNet-SSD 输入尺寸
pub const SSD_INPUT_SIZE: u32 = 300;

// ========== 数据结构 ==========

/// 单个候选目标的检测记录 (检测器 → 分类器)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionRecord {
    pub class_id: u32,
    pub confidence: f32, // [0, 1]
}

impl DetectionRecord {
    pub fn new(class_id: u32, confidence: f32) -> Self {
        Self {
            class_id,
            confidence,
        }
    }
}
