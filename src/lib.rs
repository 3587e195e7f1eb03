//! 伤亡报告台
//!
//! 本地优先的现场事故报告记录、存档与检索平台

pub mod config;
pub mod report;
pub mod storage;

pub use anyhow::Result;
