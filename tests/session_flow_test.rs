//! 编辑会话集成测试
//!
//! 覆盖 空白草稿 -> 录入 -> 保存 -> 重新加载 -> 再保存 的完整流程

use anyhow::Result;
use casualty_report::config::{Config, DatabaseConfig, FormConfig, LogFormat, LogLevel, LoggingConfig};
use casualty_report::report::{BodyView, Marker, Observation, ReportSession};
use casualty_report::storage::{ReportStore, StoreError};
use std::path::PathBuf;
use tempfile::TempDir;

/// 创建测试配置
fn create_test_config(temp_dir: &TempDir) -> Config {
    let db_path = temp_dir.path().join("reports.db");

    Config {
        database: DatabaseConfig {
            url: format!("sqlite:{}", db_path.display()),
            max_connections: 5,
            connect_timeout: 30,
        },
        form: FormConfig {
            diagram_width: 300,
            diagram_height: 600,
            front_image: PathBuf::from("docs/front.png"),
            back_image: PathBuf::from("docs/back.png"),
        },
        logging: LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Compact,
            directory: None,
            max_file_size_mb: 10,
            max_files: 5,
        },
    }
}

fn vitals_row() -> Observation {
    Observation {
        time: "08:00".to_string(),
        pulse: "80".to_string(),
        bp: "120/80".to_string(),
        breaths: "16".to_string(),
        gcs: "15".to_string(),
        pupil_l: "3".to_string(),
        pupil_r: "3".to_string(),
        react_l: "Yes".to_string(),
        react_r: "Yes".to_string(),
    }
}

#[tokio::test]
async fn test_blank_report_with_one_observation_saves_once() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir);
    let store = ReportStore::new(&config.database.url).await?;

    let mut session = ReportSession::new(&config);
    session.add_observation(Some(vitals_row()));
    assert!(session.is_dirty());

    let id = session.save(&store).await?;
    assert!(!session.is_dirty());
    assert_eq!(session.current_id(), Some(id));

    // 仓库里恰好一行，记录值与录入一致
    let partition = store.list().await?;
    assert_eq!(partition.active.len(), 1);
    assert!(partition.archived.is_empty());

    let report = &partition.active[0];
    assert_eq!(report.observations.len(), 1);
    assert_eq!(report.observations[0], vitals_row());
    assert!(!report.archived);
    Ok(())
}

#[tokio::test]
async fn test_diagram_markers_round_trip_through_save_and_load() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir);
    let store = ReportStore::new(&config.database.url).await?;

    let mut session = ReportSession::new(&config);
    session.tap(BodyView::Front, 50.0, 60.0);
    assert!(session.choose_code(BodyView::Front, "L"));
    session.tap(BodyView::Back, 120.0, 300.0);
    assert!(session.choose_code(BodyView::Back, "Am"));

    let id = session.save(&store).await?;

    // 新会话加载后标记原样回放
    let mut reloaded = ReportSession::new(&config);
    reloaded.load(&store, id).await?;
    assert!(!reloaded.is_dirty());
    assert_eq!(
        reloaded.diagram(BodyView::Front).snapshot(),
        vec![Marker::new(50.0, 60.0, "L")]
    );
    assert_eq!(
        reloaded.diagram(BodyView::Back).snapshot(),
        vec![Marker::new(120.0, 300.0, "Am")]
    );

    // 撤销后再保存，集合清空
    assert!(reloaded.undo_marker(BodyView::Front));
    assert!(reloaded.is_dirty());
    reloaded.save(&store).await?;

    let fetched = store.get(id).await?;
    assert!(fetched.diagram_front.is_empty());
    assert_eq!(fetched.diagram_back.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_edit_in_place_keeps_identity_and_created() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir);
    let store = ReportStore::new(&config.database.url).await?;

    let mut session = ReportSession::new(&config);
    session.draft_mut().recurring = "No".to_string();
    let id = session.save(&store).await?;
    let created = store.get(id).await?.created;

    // 同一会话里反复编辑保存，不产生新行
    session.draft_mut().recurring = "Yes".to_string();
    session.draft_mut().recurring_date = "2024-01-01".to_string();
    assert_eq!(session.save(&store).await?, id);

    let mut reloaded = ReportSession::new(&config);
    reloaded.load(&store, id).await?;
    reloaded.draft_mut().history = "twisted ankle on haul road".to_string();
    assert_eq!(reloaded.save(&store).await?, id);

    let partition = store.list().await?;
    assert_eq!(partition.active.len(), 1);

    let fetched = store.get(id).await?;
    assert_eq!(fetched.recurring, "Yes");
    assert_eq!(fetched.recurring_date, "2024-01-01");
    assert_eq!(fetched.history, "twisted ankle on haul road");
    assert_eq!(fetched.created, created);
    Ok(())
}

#[tokio::test]
async fn test_failed_save_preserves_draft_and_dirty_flag() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir);
    let store = ReportStore::new(&config.database.url).await?;

    let mut session = ReportSession::new(&config);
    session.draft_mut().patient_name = "Jo Field".to_string();
    let id = session.save(&store).await?;

    // 行在会话背后被删掉（良性竞态），更新必须硬失败
    store.remove(id).await?;
    session.draft_mut().patient_name = "Jo B. Field".to_string();

    let result = session.save(&store).await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));

    // 草稿和脏标志原样保留，用户可以重试
    assert!(session.is_dirty());
    assert_eq!(session.draft().patient_name, "Jo B. Field");
    Ok(())
}

#[tokio::test]
async fn test_signature_is_carried_opaquely() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir);
    let store = ReportStore::new(&config.database.url).await?;

    let data_uri = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg".to_string();

    let mut session = ReportSession::new(&config);
    session.set_signature(Some(data_uri.clone()));
    session.draft_mut().signer_name = "M. Ranger".to_string();
    let id = session.save(&store).await?;

    let fetched = store.get(id).await?;
    assert_eq!(fetched.signature, Some(data_uri));
    assert_eq!(fetched.signer_name, "M. Ranger");
    Ok(())
}
