//! 存储模块
//!
//! 基于 SQLite 的本地报告仓库。`reports` 表以自增整数为主键，
//! `body` 列存放完整的报告 JSON，`id`/`created`/`archived`
//! 三个权威列在读取时覆盖 body 里的同名字段。

use crate::report::model::Report;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

/// 仓库专用错误类型
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// 存储打开失败，在恢复之前所有仓库操作都不可用
    #[error("存储不可用: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    /// 提交未完成；不自动重试，内存中的草稿保留以便手动重试
    #[error("事务提交失败: {0}")]
    TransactionFailed(#[from] sqlx::Error),

    /// 引用了存储中不存在的 id
    #[error("报告不存在: id={id}")]
    NotFound { id: i64 },

    /// 报告行编解码失败
    #[error("报告编解码失败: {0}")]
    Codec(#[from] serde_json::Error),
}

/// list() 的结果：按生命周期分成两个互斥的桶
#[derive(Debug, Default)]
pub struct ReportPartition {
    pub active: Vec<Report>,
    pub archived: Vec<Report>,
}

/// 报告仓库
///
/// 进程内只初始化一次，连接池在整个会话期间不关闭。
/// 每条变更都是单行语句：要么整行写入/删除，要么什么都不变。
pub struct ReportStore {
    pool: SqlitePool,
}

impl ReportStore {
    /// 打开仓库
    ///
    /// 任何阶段失败（目录、连接、pragma、迁移）都算存储不可用。
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        tracing::info!("正在初始化报告仓库...");

        // 确保数据库目录存在
        if let Some(parent) = Path::new(database_url.trim_start_matches("sqlite:")).parent() {
            if !parent.exists() && !parent.as_os_str().is_empty() {
                tracing::debug!("创建数据库目录: {:?}", parent);
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::StorageUnavailable(sqlx::Error::Io(e)))?;
            }
        }

        tracing::info!("正在连接数据库: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StoreError::StorageUnavailable)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .idle_timeout(std::time::Duration::from_secs(60))
            .connect_with(options)
            .await
            .map_err(StoreError::StorageUnavailable)?;

        // 设置 SQLite 优化参数
        tracing::debug!("设置 SQLite 优化参数");
        for pragma in [
            "PRAGMA journal_mode = WAL",
            "PRAGMA synchronous = NORMAL",
            "PRAGMA busy_timeout = 5000",
            "PRAGMA temp_store = MEMORY",
        ] {
            sqlx::query(pragma)
                .execute(&pool)
                .await
                .map_err(StoreError::StorageUnavailable)?;
        }

        tracing::info!("正在运行数据库迁移...");

        // 运行迁移，添加超时保护
        let migrate_result = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            sqlx::migrate!("./migrations").run(&pool),
        )
        .await;

        match migrate_result {
            Ok(Ok(())) => tracing::info!("数据库迁移完成"),
            Ok(Err(e)) => return Err(StoreError::StorageUnavailable(e.into())),
            Err(_) => {
                tracing::error!("数据库迁移超时（10秒）");
                return Err(StoreError::StorageUnavailable(sqlx::Error::PoolTimedOut));
            }
        }

        tracing::info!("报告仓库初始化完成");
        Ok(Self { pool })
    }

    /// 创建报告
    ///
    /// 分配新 id，写入 `created`（当前时间）并置 `archived=false`，
    /// 返回落库后的完整聚合体。
    pub async fn create(&self, report: &Report) -> Result<Report, StoreError> {
        let mut stored = report.clone();
        stored.id = None;
        stored.created = Some(Utc::now());
        stored.archived = false;

        let body = serde_json::to_string(&stored)?;
        let result =
            sqlx::query("INSERT INTO reports (body, created, archived) VALUES (?1, ?2, ?3)")
                .bind(&body)
                .bind(stored.created)
                .bind(stored.archived)
                .execute(&self.pool)
                .await?;

        stored.id = Some(result.last_insert_rowid());
        tracing::info!("已创建报告 id={}", result.last_insert_rowid());
        Ok(stored)
    }

    /// 原地覆盖已存在的报告行
    ///
    /// `created` 列不在更新语句里，原始时间戳总是保留，
    /// 无论调用方的 `created` 字段带了什么值。
    pub async fn update(&self, id: i64, report: &Report) -> Result<(), StoreError> {
        let mut stored = report.clone();
        stored.id = Some(id);

        let body = serde_json::to_string(&stored)?;
        let result = sqlx::query("UPDATE reports SET body = ?1, archived = ?2 WHERE id = ?3")
            .bind(&body)
            .bind(stored.archived)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }
        tracing::info!("已更新报告 id={}", id);
        Ok(())
    }

    /// 读取报告
    pub async fn get(&self, id: i64) -> Result<Report, StoreError> {
        let row = sqlx::query("SELECT id, body, created, archived FROM reports WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::hydrate(&row),
            None => Err(StoreError::NotFound { id }),
        }
    }

    /// 列出全部报告，按归档标志分区
    ///
    /// 行按主键顺序返回；除了 活动/归档 的划分之外，
    /// 调用方不应依赖其它顺序。
    pub async fn list(&self) -> Result<ReportPartition, StoreError> {
        let rows = sqlx::query("SELECT id, body, created, archived FROM reports ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut partition = ReportPartition::default();
        for row in rows {
            let report = Self::hydrate(&row)?;
            if report.archived {
                partition.archived.push(report);
            } else {
                partition.active.push(report);
            }
        }
        Ok(partition)
    }

    /// 设置归档标志
    ///
    /// 只改动 `archived` 这一列，其余字段原样保留。
    pub async fn set_archived(&self, id: i64, archived: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE reports SET archived = ?1 WHERE id = ?2")
            .bind(archived)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }
        tracing::info!("已设置报告 id={} archived={}", id, archived);
        Ok(())
    }

    /// 删除报告行，幂等：id 不存在不算错误，返回是否真的删除了
    pub async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 从行还原报告，权威列覆盖 body 内容
    fn hydrate(row: &SqliteRow) -> Result<Report, StoreError> {
        let body: String = row.get("body");
        let mut report: Report = serde_json::from_str(&body)?;

        let created: DateTime<Utc> = row.get("created");
        report.id = Some(row.get("id"));
        report.created = Some(created);
        report.archived = row.get("archived");
        Ok(report)
    }

    /// 获取数据库连接池（用于高级操作）
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
