//! 示意图控制器
//!
//! 在标记画布之上套一层模态的代码选择交互：
//! 点击 -> 选代码 -> 提交标记，或者取消

use crate::report::marker::{DrawCmd, Marker, MarkerCanvas, CODE_SENTINEL};

/// 选择器状态
///
/// 每个示意图实例同时最多只有一个打开的选择会话。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickerState {
    Idle,
    /// 记住了点击坐标，等待选择代码
    Picking { x: f64, y: f64 },
}

/// 示意图控制器
///
/// 把指针事件翻译成对标记画布的提交/取消操作。
/// 正面、背面各一个实例，互不共享状态。
#[derive(Debug, Clone)]
pub struct DiagramController {
    canvas: MarkerCanvas,
    picker: PickerState,
}

impl DiagramController {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: MarkerCanvas::new(width, height),
            picker: PickerState::Idle,
        }
    }

    /// 指针点击：在点击处打开选择器
    ///
    /// 已处于选择状态时，新的点击隐式丢弃之前挂起的坐标（最后一次点击生效）。
    pub fn pointer_tap(&mut self, x: f64, y: f64) {
        if let PickerState::Picking { .. } = self.picker {
            tracing::debug!("丢弃挂起的选择会话，改用新的点击位置");
        }
        self.picker = PickerState::Picking { x, y };
    }

    /// 选择了一个代码
    ///
    /// 占位符视同取消，不产生任何变更；合法代码在挂起坐标处提交标记。
    /// 无论哪种情况选择会话都结束。返回是否真的提交了。
    pub fn code_chosen(&mut self, code: &str) -> bool {
        match self.picker {
            PickerState::Idle => false,
            PickerState::Picking { x, y } => {
                self.picker = PickerState::Idle;
                if code == CODE_SENTINEL {
                    return false;
                }
                self.canvas.add_marker(x, y, code)
            }
        }
    }

    /// 取消当前选择会话，不产生任何变更
    pub fn dismiss(&mut self) {
        self.picker = PickerState::Idle;
    }

    /// 撤销最近的标记
    ///
    /// 同时关闭可能打开的选择会话，避免之后在过期的坐标上提交。
    pub fn undo(&mut self) -> bool {
        self.picker = PickerState::Idle;
        self.canvas.undo_last()
    }

    pub fn is_picking(&self) -> bool {
        matches!(self.picker, PickerState::Picking { .. })
    }

    /// 挂起的点击坐标（供选择器定位用）
    pub fn pending(&self) -> Option<(f64, f64)> {
        match self.picker {
            PickerState::Picking { x, y } => Some((x, y)),
            PickerState::Idle => None,
        }
    }

    pub fn snapshot(&self) -> Vec<Marker> {
        self.canvas.snapshot()
    }

    pub fn replace_all(&mut self, markers: &[Marker]) {
        self.canvas.replace_all(markers);
    }

    pub fn render(&self) -> Vec<DrawCmd> {
        self.canvas.render()
    }

    pub fn canvas(&self) -> &MarkerCanvas {
        &self.canvas
    }
}
