use anyhow::Result;
use casualty_report::config::{Cli, Commands, Config};
use casualty_report::report::model::Report;
use casualty_report::storage::ReportStore;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load_with_cli(cli.clone())?;

    // 初始化日志系统
    config.init_logging()?;

    tracing::info!("Casualty Report Desk Starting...");

    // 没给子命令时默认列出报告
    let command = cli.command.unwrap_or(Commands::List);
    handle_command(command, &config).await?;

    Ok(())
}

async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::List => {
            let store = ReportStore::new(&config.database.url).await?;
            let partition = store.list().await?;

            println!("活动报告 ({}):", partition.active.len());
            for report in &partition.active {
                println!("  {}", summary_line(report));
            }
            println!("已归档 ({}):", partition.archived.len());
            for report in &partition.archived {
                println!("  {}", summary_line(report));
            }
        }
        Commands::Show { id } => {
            let store = ReportStore::new(&config.database.url).await?;
            let report = store.get(id).await?;

            println!("报告 #{id}");
            println!("  伤者: {}", report.patient_name);
            println!("  受伤日期: {} {}", report.injury_date, report.injury_time);
            println!("  地点: {}", report.injury_location);
            println!("  生命体征记录: {} 条", report.observations.len());
            println!(
                "  示意图标记: 正面 {} / 背面 {}",
                report.diagram_front.len(),
                report.diagram_back.len()
            );
            println!(
                "  签名: {}",
                if report.signature.is_some() {
                    "已采集"
                } else {
                    "未采集"
                }
            );
            if let Some(created) = report.created {
                println!("  首次保存: {}", created.to_rfc3339());
            }
            println!("  已归档: {}", if report.archived { "是" } else { "否" });
        }
        Commands::Archive { id } => {
            let store = ReportStore::new(&config.database.url).await?;
            store.set_archived(id, true).await?;
            println!("报告 #{id} 已归档");
        }
        Commands::Restore { id } => {
            let store = ReportStore::new(&config.database.url).await?;
            store.set_archived(id, false).await?;
            println!("报告 #{id} 已恢复到活动列表");
        }
        Commands::Remove { id } => {
            let store = ReportStore::new(&config.database.url).await?;
            if store.remove(id).await? {
                println!("报告 #{id} 已删除");
            } else {
                println!("报告 #{id} 不存在");
            }
        }
        Commands::ResetConfig => {
            // 重置配置
            let default_config = Config::default();
            if let Some(config_path) = Config::get_user_config_path() {
                default_config.save_to_file(&config_path)?;
                println!("配置已重置到: {}", config_path.display());
            } else {
                println!("无法确定配置文件路径");
            }
        }
    }

    Ok(())
}

fn summary_line(report: &Report) -> String {
    let id = report.id.unwrap_or_default();
    let name = if report.patient_name.is_empty() {
        "(未填写)"
    } else {
        &report.patient_name
    };
    let created = report
        .created
        .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!("#{id} {name} 受伤日期: {} 保存于: {created}", report.injury_date)
}
