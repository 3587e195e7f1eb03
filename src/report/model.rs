//! 报告数据模型
//!
//! 持久化的报告聚合体，字段名与存储的 JSON 行保持 camelCase 一致

use crate::report::marker::Marker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一次生命体征记录
///
/// 所有值按表单给出的原样存储（GCS 1-15、瞳孔 1-5 等范围
/// 只是输入控件的约束，本层不做校验）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Observation {
    /// 记录时间（HH:MM）
    pub time: String,
    /// 脉搏
    pub pulse: String,
    /// 血压（自由文本，如 "120/80"）
    pub bp: String,
    /// 呼吸频率
    pub breaths: String,
    /// 格拉斯哥昏迷评分
    pub gcs: String,
    /// 左瞳孔大小
    pub pupil_l: String,
    /// 右瞳孔大小
    pub pupil_r: String,
    /// 左瞳孔对光反应（""/"Yes"/"No"）
    pub react_l: String,
    /// 右瞳孔对光反应（""/"Yes"/"No"）
    pub react_r: String,
}

/// 氧疗记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OxygenTherapy {
    pub yes: bool,
    /// 8 L/min
    pub eight: bool,
    /// 15 L/min
    pub fifteen: bool,
    /// 复苏面罩
    pub resus: bool,
}

/// 报告聚合体，持久化的最小单元
///
/// `id` 由存储在首次创建时分配，编辑已有报告期间保持不变；
/// `created` 在首次保存时写入一次，之后任何更新都不会覆盖。
/// 整个结构体 `#[serde(default)]`，旧版本写入的行按默认值补齐
/// （字段只增不改的演进策略）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    /// 存储分配的主键
    pub id: Option<i64>,

    // 伤者身份信息
    pub patient_name: String,
    pub dob: String,
    pub gender: String,
    pub injury_date: String,
    pub injury_time: String,
    pub home_address: String,
    pub town: String,
    pub state: String,
    pub postcode: String,
    pub employee_no: String,
    pub contractor: String,
    pub occupation: String,
    pub shift_start: String,
    pub injury_location: String,

    // 病史
    pub history: String,
    /// 是否复发性伤情（"Yes"/"No"）
    pub recurring: String,
    pub recurring_date: String,

    // 初步评估
    pub danger: bool,
    pub response: String,
    pub airway: String,
    pub breathing: String,
    pub signs_of_life: String,

    /// 生命体征记录（顺序即录入顺序）
    pub observations: Vec<Observation>,

    /// 正面示意图标记
    pub diagram_front: Vec<Marker>,
    /// 背面示意图标记
    pub diagram_back: Vec<Marker>,

    // 二次评估
    pub fluid_injury: String,
    pub breath_sounds: Vec<String>,
    pub remember: String,
    pub hurt_most: String,
    pub pain_rating: String,
    pub deep_breath: String,
    /// 是否有过敏史（"Yes"/"No"）
    pub allergies: String,
    pub allergy_details: String,
    pub illnesses: Vec<String>,
    pub regular_meds: String,
    pub today_meds: String,
    pub heart_rate: String,
    pub blood_pressure: String,

    // 处置
    pub treatment: String,
    /// 签名位图（data URI），本层视为不透明数据
    pub signature: Option<String>,
    pub signer_name: String,

    // 急救处置
    pub first_aid_treatment: String,
    /// 是否使用 Penthrox（"Yes"/"No"）
    pub penthrox: String,
    pub penthrox3ml: bool,
    pub penthrox6ml: bool,
    pub dose1_time: String,
    pub dose2_time: String,
    pub oxygen: OxygenTherapy,
    /// 是否使用 Ventolin（"Yes"/"No"）
    pub ventolin: String,
    pub ventolin_time: String,
    pub hand_unit_time: String,
    pub aero_med_time: String,
    pub evacuation: Vec<String>,

    /// 首次保存时间，由存储写入且不再改变
    pub created: Option<DateTime<Utc>>,
    /// 归档标志，归档操作只改动这一个字段
    pub archived: bool,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            id: None,
            patient_name: String::new(),
            dob: String::new(),
            gender: String::new(),
            injury_date: String::new(),
            injury_time: String::new(),
            home_address: String::new(),
            town: String::new(),
            state: String::new(),
            postcode: String::new(),
            employee_no: String::new(),
            contractor: String::new(),
            occupation: String::new(),
            shift_start: String::new(),
            injury_location: String::new(),
            history: String::new(),
            recurring: "No".to_string(),
            recurring_date: String::new(),
            danger: false,
            response: String::new(),
            airway: String::new(),
            breathing: String::new(),
            signs_of_life: String::new(),
            observations: Vec::new(),
            diagram_front: Vec::new(),
            diagram_back: Vec::new(),
            fluid_injury: String::new(),
            breath_sounds: Vec::new(),
            remember: String::new(),
            hurt_most: String::new(),
            pain_rating: String::new(),
            deep_breath: String::new(),
            allergies: "No".to_string(),
            allergy_details: String::new(),
            illnesses: Vec::new(),
            regular_meds: String::new(),
            today_meds: String::new(),
            heart_rate: String::new(),
            blood_pressure: String::new(),
            treatment: String::new(),
            signature: None,
            signer_name: String::new(),
            first_aid_treatment: String::new(),
            penthrox: "No".to_string(),
            penthrox3ml: false,
            penthrox6ml: false,
            dose1_time: String::new(),
            dose2_time: String::new(),
            oxygen: OxygenTherapy::default(),
            ventolin: "No".to_string(),
            ventolin_time: String::new(),
            hand_unit_time: String::new(),
            aero_med_time: String::new(),
            evacuation: Vec::new(),
            created: None,
            archived: false,
        }
    }
}

impl Report {
    /// 标记数量（正反面合计）
    pub fn marker_count(&self) -> usize {
        self.diagram_front.len() + self.diagram_back.len()
    }

    /// 是否已持久化过
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
