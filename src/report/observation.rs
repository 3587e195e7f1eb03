//! 生命体征记录表
//!
//! 有序的记录行集合，每行可独立增删

use crate::report::model::Observation;

/// 行句柄
///
/// 内部自增 id，不是表中的位置；删除前面的行不会使它失效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(u64);

/// 记录表模型
///
/// 行顺序即录入顺序（对按时间排列的生命体征有意义），
/// 行之间相互独立，删除不影响其余行的顺序。
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    rows: Vec<(RowHandle, Observation)>,
    next_id: u64,
}

impl ObservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一行
    ///
    /// 交互路径传 `None` 得到空白行，加载路径传已保存的值。
    /// 返回的句柄用于之后的编辑和删除。
    pub fn add_row(&mut self, initial: Option<Observation>) -> RowHandle {
        let handle = RowHandle(self.next_id);
        self.next_id += 1;
        self.rows.push((handle, initial.unwrap_or_default()));
        handle
    }

    /// 删除句柄指向的那一行，返回是否真的删除了
    pub fn remove_row(&mut self, handle: RowHandle) -> bool {
        let before = self.rows.len();
        self.rows.retain(|(h, _)| *h != handle);
        self.rows.len() != before
    }

    pub fn row(&self, handle: RowHandle) -> Option<&Observation> {
        self.rows
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, obs)| obs)
    }

    pub fn row_mut(&mut self, handle: RowHandle) -> Option<&mut Observation> {
        self.rows
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, obs)| obs)
    }

    /// 当前行值的有序副本
    pub fn snapshot(&self) -> Vec<Observation> {
        self.rows.iter().map(|(_, obs)| obs.clone()).collect()
    }

    /// 清空并按持久化的序列重建，保持顺序
    pub fn replace_all(&mut self, rows: &[Observation]) {
        self.rows.clear();
        for obs in rows {
            self.add_row(Some(obs.clone()));
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
