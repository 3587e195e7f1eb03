//! 报告编辑模块
//!
//! 负责编辑会话的组件编排和脏状态跟踪

pub mod diagram;
pub mod marker;
pub mod model;
pub mod observation;

pub use diagram::{DiagramController, PickerState};
pub use marker::{Marker, MarkerCanvas, CODE_SENTINEL, INJURY_CODES};
pub use model::{Observation, OxygenTherapy, Report};
pub use observation::{ObservationTable, RowHandle};

use crate::config::Config;
use crate::storage::{ReportStore, StoreError};

/// 身体视图：正面或背面示意图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyView {
    Front,
    Back,
}

/// 脏状态跟踪器
///
/// 二值标志：内存草稿是否与最近持久化的版本有差异。
/// 只有保存成功或进入新草稿/加载已有报告时才回到干净态。
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty: bool,
}

impl DirtyTracker {
    pub fn mark(&mut self) {
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 保存状态提示文本
    pub fn status_label(&self) -> &'static str {
        if self.dirty {
            "Not Saved"
        } else {
            "Saved"
        }
    }
}

/// 报告编辑会话
///
/// 显式的编辑上下文对象：持有标量草稿、两个示意图控制器、
/// 记录表和脏状态。进入表单时创建，保存/放弃/离开后丢弃。
/// 当前编辑的 id 跟随会话走，不存在进程级全局状态。
pub struct ReportSession {
    draft: Report,
    front: DiagramController,
    back: DiagramController,
    observations: ObservationTable,
    dirty: DirtyTracker,
    current: Option<i64>,
}

impl ReportSession {
    /// 新建空白草稿会话，画布尺寸取自配置
    pub fn new(config: &Config) -> Self {
        let width = config.form.diagram_width;
        let height = config.form.diagram_height;
        Self {
            draft: Report::default(),
            front: DiagramController::new(width, height),
            back: DiagramController::new(width, height),
            observations: ObservationTable::new(),
            dirty: DirtyTracker::default(),
            current: None,
        }
    }

    fn diagram_mut(&mut self, view: BodyView) -> &mut DiagramController {
        match view {
            BodyView::Front => &mut self.front,
            BodyView::Back => &mut self.back,
        }
    }

    pub fn diagram(&self, view: BodyView) -> &DiagramController {
        match view {
            BodyView::Front => &self.front,
            BodyView::Back => &self.back,
        }
    }

    // 示意图操作

    /// 在示意图上点击，打开代码选择会话
    pub fn tap(&mut self, view: BodyView, x: f64, y: f64) {
        self.diagram_mut(view).pointer_tap(x, y);
    }

    /// 为挂起的点击选择代码；只有真正提交了标记才算一次变更
    pub fn choose_code(&mut self, view: BodyView, code: &str) -> bool {
        let committed = self.diagram_mut(view).code_chosen(code);
        if committed {
            self.dirty.mark();
        }
        committed
    }

    /// 取消打开的选择会话，不算变更
    pub fn dismiss_picker(&mut self, view: BodyView) {
        self.diagram_mut(view).dismiss();
    }

    /// 撤销最近的标记；空集合上的撤销不算变更
    pub fn undo_marker(&mut self, view: BodyView) -> bool {
        let removed = self.diagram_mut(view).undo();
        if removed {
            self.dirty.mark();
        }
        removed
    }

    // 记录表操作

    pub fn add_observation(&mut self, initial: Option<Observation>) -> RowHandle {
        let handle = self.observations.add_row(initial);
        self.dirty.mark();
        handle
    }

    pub fn remove_observation(&mut self, handle: RowHandle) -> bool {
        let removed = self.observations.remove_row(handle);
        if removed {
            self.dirty.mark();
        }
        removed
    }

    /// 整行替换句柄指向的记录值
    pub fn update_observation(&mut self, handle: RowHandle, values: Observation) -> bool {
        match self.observations.row_mut(handle) {
            Some(row) => {
                *row = values;
                self.dirty.mark();
                true
            }
            None => false,
        }
    }

    pub fn observations(&self) -> &ObservationTable {
        &self.observations
    }

    // 标量字段和签名

    pub fn draft(&self) -> &Report {
        &self.draft
    }

    /// 可变访问标量草稿；表单输入事件等同于一次变更
    pub fn draft_mut(&mut self) -> &mut Report {
        self.dirty.mark();
        &mut self.draft
    }

    /// 安装或清除签名位图（不透明的 data URI）
    pub fn set_signature(&mut self, signature: Option<String>) {
        self.draft.signature = signature;
        self.dirty.mark();
    }

    /// 表单层的通用变更通知
    pub fn mark_dirty(&mut self) {
        self.dirty.mark();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn save_status(&self) -> &'static str {
        self.dirty.status_label()
    }

    pub fn current_id(&self) -> Option<i64> {
        self.current
    }

    /// 从各组件状态组装完整的报告聚合体
    pub fn assemble(&self) -> Report {
        let mut report = self.draft.clone();
        report.id = self.current;
        report.observations = self.observations.snapshot();
        report.diagram_front = self.front.snapshot();
        report.diagram_back = self.back.snapshot();
        report
    }

    /// 保存当前会话
    ///
    /// 没有 id 时创建（会话随即采用存储分配的 id），
    /// 有 id 时原地更新。只有提交成功才清除脏标志；
    /// 失败时草稿原样保留，用户可以手动重试。
    pub async fn save(&mut self, store: &ReportStore) -> Result<i64, StoreError> {
        let report = self.assemble();
        let id = match self.current {
            Some(id) => {
                store.update(id, &report).await?;
                id
            }
            None => {
                let stored = store.create(&report).await?;
                self.current = stored.id;
                self.draft.created = stored.created;
                stored.id.unwrap_or_default()
            }
        };
        self.dirty.clear();
        tracing::info!("会话已保存 id={}", id);
        Ok(id)
    }

    /// 加载已保存的报告进入编辑
    ///
    /// 加载完成后立即回到干净态：刚载入的状态定义上就是已保存的。
    pub async fn load(&mut self, store: &ReportStore, id: i64) -> Result<(), StoreError> {
        let report = store.get(id).await?;

        self.front.replace_all(&report.diagram_front);
        self.back.replace_all(&report.diagram_back);
        self.observations.replace_all(&report.observations);
        self.current = report.id;
        self.draft = report;
        self.dirty.clear();
        tracing::info!("已加载报告 id={} 进入编辑", id);
        Ok(())
    }

    /// 丢弃当前内容，开始新的空白草稿
    pub fn new_draft(&mut self) {
        self.draft = Report::default();
        self.front.replace_all(&[]);
        self.back.replace_all(&[]);
        self.observations.replace_all(&[]);
        self.current = None;
        self.dirty.clear();
    }

    /// 离开编辑上下文前的确认闸门
    ///
    /// 干净时直接放行；脏时交给外部提供的确认能力决定。
    /// 拒绝则取消离开，脏标志和编辑上下文都不动。
    /// 具体的确认机制（对话框等）由外层 UI 决定。
    pub fn request_leave<F>(&self, confirm: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        if !self.dirty.is_dirty() {
            return true;
        }
        confirm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> ReportSession {
        ReportSession::new(&Config::default())
    }

    #[test]
    fn test_new_session_is_clean() {
        let session = test_session();
        assert!(!session.is_dirty());
        assert_eq!(session.save_status(), "Saved");
        assert!(session.current_id().is_none());
    }

    #[test]
    fn test_accepted_marker_commit_sets_dirty() {
        let mut session = test_session();
        session.tap(BodyView::Front, 50.0, 60.0);
        assert!(!session.is_dirty());

        assert!(session.choose_code(BodyView::Front, "L"));
        assert!(session.is_dirty());
        assert_eq!(session.save_status(), "Not Saved");
    }

    #[test]
    fn test_cancelled_pick_does_not_set_dirty() {
        let mut session = test_session();

        session.tap(BodyView::Front, 50.0, 60.0);
        session.dismiss_picker(BodyView::Front);
        assert!(!session.is_dirty());

        // 占位符提交同样不算变更
        session.tap(BodyView::Back, 10.0, 10.0);
        assert!(!session.choose_code(BodyView::Back, CODE_SENTINEL));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_undo_on_empty_diagram_does_not_set_dirty() {
        let mut session = test_session();
        assert!(!session.undo_marker(BodyView::Front));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_observation_mutations_set_dirty() {
        let mut session = test_session();
        let handle = session.add_observation(None);
        assert!(session.is_dirty());

        session.dirty.clear();
        assert!(session.update_observation(
            handle,
            Observation {
                pulse: "80".to_string(),
                ..Observation::default()
            }
        ));
        assert!(session.is_dirty());

        session.dirty.clear();
        assert!(session.remove_observation(handle));
        assert!(session.is_dirty());

        // 已删除的句柄不再算变更
        session.dirty.clear();
        assert!(!session.remove_observation(handle));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_field_edit_and_signature_set_dirty() {
        let mut session = test_session();
        session.draft_mut().patient_name = "Jo Field".to_string();
        assert!(session.is_dirty());

        let mut session = test_session();
        session.set_signature(Some("data:image/png;base64,AAAA".to_string()));
        assert!(session.is_dirty());
    }

    #[test]
    fn test_assemble_collects_component_state() {
        let mut session = test_session();
        session.draft_mut().patient_name = "Jo Field".to_string();
        session.tap(BodyView::Front, 50.0, 60.0);
        session.choose_code(BodyView::Front, "L");
        session.add_observation(Some(Observation {
            time: "08:00".to_string(),
            ..Observation::default()
        }));

        let report = session.assemble();
        assert_eq!(report.patient_name, "Jo Field");
        assert_eq!(report.diagram_front, vec![Marker::new(50.0, 60.0, "L")]);
        assert!(report.diagram_back.is_empty());
        assert_eq!(report.observations.len(), 1);
        assert!(report.id.is_none());
    }

    #[test]
    fn test_request_leave_clean_passes_without_asking() {
        let session = test_session();
        let mut asked = false;
        let allowed = session.request_leave(|| {
            asked = true;
            false
        });
        // 干净时直接放行，不调用确认能力
        assert!(allowed);
        assert!(!asked);
    }

    #[test]
    fn test_request_leave_dirty_respects_confirmation() {
        let mut session = test_session();
        session.mark_dirty();

        assert!(!session.request_leave(|| false));
        // 拒绝后一切保持原样
        assert!(session.is_dirty());
        assert!(session.request_leave(|| true));
    }

    #[test]
    fn test_new_draft_resets_everything() {
        let mut session = test_session();
        session.draft_mut().patient_name = "Jo Field".to_string();
        session.tap(BodyView::Front, 1.0, 1.0);
        session.choose_code(BodyView::Front, "A");
        session.add_observation(None);

        session.new_draft();
        assert!(!session.is_dirty());
        assert!(session.current_id().is_none());
        assert!(session.draft().patient_name.is_empty());
        assert!(session.diagram(BodyView::Front).snapshot().is_empty());
        assert!(session.observations().is_empty());
    }
}
