//! 人体示意图标记
//!
//! 在固定尺寸的画布平面上维护按插入顺序排列的 (x, y, 伤情代码) 注记

use serde::{Deserialize, Serialize};

/// 伤情代码表
///
/// 闭集。首项为占位符，顺序即选择器中的显示顺序。
pub const INJURY_CODES: [&str; 12] = [
    "Select an injury...",
    "A",
    "L",
    "B",
    "P",
    "S",
    "O",
    "Am",
    "C",
    "T",
    "D",
    "E",
];

/// 占位符代码，永远不是合法的提交值
pub const CODE_SENTINEL: &str = INJURY_CODES[0];

/// 判断代码是否属于代码表（占位符除外）
pub fn is_valid_code(code: &str) -> bool {
    INJURY_CODES[1..].iter().any(|c| *c == code)
}

/// 一条伤情注记
///
/// 坐标是采集时画布的像素坐标，不做归一化；
/// 回放必须使用采集时的画布尺寸，否则位置会漂移。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub code: String,
}

impl Marker {
    pub fn new(x: f64, y: f64, code: impl Into<String>) -> Self {
        Self {
            x,
            y,
            code: code.into(),
        }
    }
}

/// 一条绘制指令：在 (x, y) 处绘制代码标签
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCmd {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// 标记画布
///
/// 交互编辑期间只追加，唯一的删除操作是撤销最后一条；
/// 加载已保存报告时整体替换。
#[derive(Debug, Clone)]
pub struct MarkerCanvas {
    width: u32,
    height: u32,
    markers: Vec<Marker>,
}

impl MarkerCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            markers: Vec::new(),
        }
    }

    /// 追加一条注记
    ///
    /// 占位符或代码表之外的代码静默拒绝（等同于未完成的选择手势），
    /// 返回是否真的追加了。
    pub fn add_marker(&mut self, x: f64, y: f64, code: &str) -> bool {
        if !is_valid_code(code) {
            tracing::debug!("忽略无效伤情代码: {:?}", code);
            return false;
        }
        self.markers.push(Marker::new(x, y, code));
        true
    }

    /// 撤销最近追加的注记，空集合时无操作
    pub fn undo_last(&mut self) -> bool {
        self.markers.pop().is_some()
    }

    /// 丢弃当前集合，按给定序列原样安装（加载持久化报告时使用）
    pub fn replace_all(&mut self, markers: &[Marker]) {
        self.markers = markers.to_vec();
    }

    /// 当前注记序列的独立副本，调用方可安全持久化
    pub fn snapshot(&self) -> Vec<Marker> {
        self.markers.clone()
    }

    /// 把注记集合投影为绘制指令
    ///
    /// 幂等的派生结果，绘制顺序即插入顺序。
    pub fn render(&self) -> Vec<DrawCmd> {
        self.markers
            .iter()
            .map(|m| DrawCmd {
                x: m.x,
                y: m.y,
                label: m.code.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
