//! 配置系统模块
//!
//! 统一处理 TOML 配置文件、环境变量、命令行参数

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use config::{Config as ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 命令行参数
#[derive(Parser, Debug, Clone)]
#[command(name = "casualty-report")]
#[command(about = "伤亡报告台 - 本地优先的现场事故记录平台")]
#[command(version)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(short, long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// 数据库 URL
    #[arg(short, long)]
    pub database_url: Option<String>,

    /// 子命令
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 支持的命令
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 列出全部报告（活动/已归档）
    List,
    /// 显示一份报告
    Show {
        /// 报告 id
        id: i64,
    },
    /// 归档报告
    Archive {
        /// 报告 id
        id: i64,
    },
    /// 取消归档
    Restore {
        /// 报告 id
        id: i64,
    },
    /// 删除报告
    Remove {
        /// 报告 id
        id: i64,
    },
    /// 重置配置
    ResetConfig,
}

/// 日志级别
#[derive(clap::ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 表单配置
    pub form: FormConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库 URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时（秒）
    pub connect_timeout: u64,
}

/// 表单配置
///
/// 示意图画布的尺寸决定标记坐标的像素空间；
/// 回放已保存的标记必须使用采集时的尺寸。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// 示意图画布宽度（像素）
    pub diagram_width: u32,
    /// 示意图画布高度（像素）
    pub diagram_height: u32,
    /// 正面人体底图
    pub front_image: PathBuf,
    /// 背面人体底图
    pub back_image: PathBuf,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 日志格式
    pub format: LogFormat,
    /// 日志输出目录
    pub directory: Option<PathBuf>,
    /// 日志文件大小限制（MB）
    pub max_file_size_mb: u32,
    /// 保留的日志文件数
    pub max_files: u32,
}

/// 日志格式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 简洁格式
    Compact,
    /// 详细格式
    Full,
    /// JSON 格式
    Json,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:reports.db".to_string(),
            max_connections: 5,
            connect_timeout: 30,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            diagram_width: 300,
            diagram_height: 600,
            front_image: PathBuf::from("docs/front.png"),
            back_image: PathBuf::from("docs/back.png"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            directory: None,
            max_file_size_mb: 10,
            max_files: 5,
        }
    }
}

impl Config {
    /// 从多种配置源加载配置
    pub fn load() -> Result<Self> {
        let cli = Cli::parse();
        Self::load_with_cli(cli)
    }

    /// 使用指定的 CLI 参数加载配置
    pub fn load_with_cli(cli: Cli) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // 1. 首先加载默认配置
        builder = builder.add_source(config::Config::try_from(&Config::default())?);

        // 2. 加载系统配置文件
        if let Some(system_config) = Self::get_system_config_path() {
            if system_config.exists() {
                builder = builder.add_source(File::from(system_config));
            }
        }

        // 3. 加载用户配置文件
        if let Some(user_config) = Self::get_user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config));
            }
        }

        // 4. 加载指定的配置文件
        if let Some(config_path) = cli.config {
            if config_path.exists() {
                builder = builder.add_source(File::from(config_path));
            } else {
                return Err(anyhow!("配置文件不存在: {}", config_path.display()));
            }
        }

        // 5. 加载环境变量（前缀 CASUALTY_REPORT_）
        builder = builder.add_source(
            Environment::with_prefix("CASUALTY_REPORT")
                .prefix_separator("_")
                .separator("__"),
        );

        // 6. 构建配置
        let mut config: Config = builder.build()?.try_deserialize()?;

        // 7. 应用命令行参数覆盖
        if let Some(log_level) = cli.log_level {
            config.logging.level = log_level;
        }

        if let Some(database_url) = cli.database_url {
            config.database.url = database_url;
        }

        // 8. 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 获取系统配置文件路径
    pub fn get_system_config_path() -> Option<PathBuf> {
        Some(PathBuf::from("/etc/casualty-report/config.toml"))
    }

    /// 获取用户配置文件路径
    pub fn get_user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "casualty-report")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// 获取数据目录
    pub fn get_data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "casualty-report").map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// 获取日志目录
    pub fn get_log_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "casualty-report").map(|dirs| dirs.cache_dir().join("logs"))
    }

    /// 生成默认配置文件
    pub fn generate_default_config() -> Result<String> {
        let config = Config::default();
        toml::to_string_pretty(&config).map_err(|e| anyhow!("生成默认配置失败: {}", e))
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| anyhow!("序列化配置失败: {}", e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置
    fn validate(&self) -> Result<()> {
        // 验证数据库 URL
        if self.database.url.is_empty() {
            return Err(anyhow!("数据库 URL 不能为空"));
        }

        // 验证画布尺寸：标记坐标以它为像素空间，不允许为零
        if self.form.diagram_width == 0 || self.form.diagram_height == 0 {
            return Err(anyhow!("示意图画布尺寸不能为 0"));
        }

        // 底图缺失不阻塞仓库操作，只提示
        if !self.form.front_image.exists() {
            tracing::warn!("正面底图不存在: {}", self.form.front_image.display());
        }
        if !self.form.back_image.exists() {
            tracing::warn!("背面底图不存在: {}", self.form.back_image.display());
        }

        // 验证日志目录
        if let Some(log_dir) = &self.logging.directory {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir)?;
            }
        }

        Ok(())
    }

    /// 初始化日志系统
    pub fn init_logging(&self) -> Result<()> {
        let level_filter = EnvFilter::builder()
            .with_default_directive(Level::from(self.logging.level.clone()).into())
            .from_env_lossy();

        // 根据格式选择不同的初始化方式
        match self.logging.format {
            LogFormat::Compact => {
                let fmt_layer = fmt::layer().compact();
                if let Some(log_dir) = &self.logging.directory {
                    std::fs::create_dir_all(log_dir)?;
                    let file_appender =
                        tracing_appender::rolling::daily(log_dir, "casualty-report.log");
                    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
                    let file_layer = fmt::layer()
                        .compact()
                        .with_ansi(false)
                        .with_writer(non_blocking);
                    tracing_subscriber::registry()
                        .with(level_filter)
                        .with(fmt_layer)
                        .with(file_layer)
                        .init();
                } else {
                    tracing_subscriber::registry()
                        .with(level_filter)
                        .with(fmt_layer)
                        .init();
                }
            }
            LogFormat::Full => {
                let fmt_layer = fmt::layer();
                if let Some(log_dir) = &self.logging.directory {
                    std::fs::create_dir_all(log_dir)?;
                    let file_appender =
                        tracing_appender::rolling::daily(log_dir, "casualty-report.log");
                    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
                    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
                    tracing_subscriber::registry()
                        .with(level_filter)
                        .with(fmt_layer)
                        .with(file_layer)
                        .init();
                } else {
                    tracing_subscriber::registry()
                        .with(level_filter)
                        .with(fmt_layer)
                        .init();
                }
            }
            LogFormat::Json => {
                let fmt_layer = fmt::layer().with_target(true).with_level(true);
                if let Some(log_dir) = &self.logging.directory {
                    std::fs::create_dir_all(log_dir)?;
                    let file_appender =
                        tracing_appender::rolling::daily(log_dir, "casualty-report.log");
                    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
                    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
                    tracing_subscriber::registry()
                        .with(level_filter)
                        .with(fmt_layer)
                        .with(file_layer)
                        .init();
                } else {
                    tracing_subscriber::registry()
                        .with(level_filter)
                        .with(fmt_layer)
                        .init();
                }
            }
        }

        tracing::info!("日志系统已初始化，级别: {:?}", self.logging.level);
        Ok(())
    }
}
