//! # 组合根演示程序
//!
//! 以桌面助手的启动流程演示组合根：从配置文件加载各组件配置，注册协作组件，
//! 启动后等待退出信号，再逆序销毁。

mod components;

use anyhow::Context;
use clap::Parser;
use companion_common::ComponentId;
use companion_composition::{Composition, CompositionBuilder, LoggingConfig};
use companion_di::{SharedContext, SHARED_CONTEXT_ID};
use companion_di_abstractions::{component_factory, ComponentLookup};
use components::{ClientInstallation, Notifications, RemoteConfig, SelfUpdate};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "companion-bootstrap")]
#[command(about = "组合根启动演示")]
struct Args {
    /// 组件配置文件路径
    #[arg(short, long, default_value = "demos/companion-bootstrap/config/companion.toml")]
    config: PathBuf,

    /// 使用生产环境日志格式（JSON）
    #[arg(long)]
    production: bool,

    /// 启动超时（秒）
    #[arg(long, default_value_t = 30)]
    setup_timeout: u64,

    /// 启动完成后等待 Ctrl+C 再退出
    #[arg(long)]
    wait: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let composition = build_composition(&args).await?;
    info!(
        "初始化顺序: {}",
        composition
            .initialization_order()
            .iter()
            .map(ComponentId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    if let Some(installation) = composition.get::<ClientInstallation>("client-installation") {
        info!("客户端目录: {:?}", installation.detected());
    }

    if args.wait {
        tokio::signal::ctrl_c().await?;
        info!("收到退出信号，正在关闭");
    }

    composition.shutdown().await.context("关闭组合根失败")?;
    info!("应用已关闭");
    Ok(())
}

/// 装配并启动组合根
async fn build_composition(args: &Args) -> anyhow::Result<Composition> {
    let logging = if args.production {
        LoggingConfig::production()
    } else {
        LoggingConfig::development()
    };

    let mut builder = CompositionBuilder::new()
        .with_logging(logging)
        .with_global("app.version", env!("CARGO_PKG_VERSION").to_string())
        .with_setup_timeout(Duration::from_secs(args.setup_timeout));

    if args.config.is_file() {
        builder = match args.config.extension().and_then(|ext| ext.to_str()) {
            Some("json") => builder.add_config_json(&args.config)?,
            _ => builder.add_config_toml(&args.config)?,
        };
    }

    let composition = builder
        .add_config_env_vars("COMPANION")
        .register_component::<ClientInstallation>()
        .register_component::<RemoteConfig>()
        .register_component::<SelfUpdate>()
        .register_external(
            "notifications",
            Some(-1),
            vec![SHARED_CONTEXT_ID, "remote-config".into()],
            component_factory(|args| Ok(Notifications::new(args.dependency::<SharedContext>(0)?))),
        )
        .build()
        .await
        .context("组合根启动失败")?;

    Ok(composition)
}
