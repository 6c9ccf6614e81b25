//! 演示用协作组件
//!
//! 每个组件只做日志输出与少量状态记录，用来展示注册方式与生命周期钩子的调用时机。

use async_trait::async_trait;
use companion_common::{BoxError, Component, ComponentId, HookResult};
use companion_di::SharedContext;
use companion_di_abstractions::{ComponentArgs, ComponentDefinition, ComponentLookup, ParamSpec};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 客户端安装位置探测
#[derive(Debug)]
pub struct ClientInstallation {
    candidates: Vec<PathBuf>,
    detected: RwLock<Option<PathBuf>>,
}

#[derive(Debug, Default, Deserialize)]
struct InstallationOptions {
    #[serde(default)]
    candidates: Vec<PathBuf>,
}

impl ClientInstallation {
    pub fn detected(&self) -> Option<PathBuf> {
        self.detected.read().clone()
    }
}

#[async_trait]
impl Component for ClientInstallation {
    async fn on_init(&self) -> HookResult {
        let found = self.candidates.iter().find(|path| path.is_dir()).cloned();
        match &found {
            Some(path) => info!("检测到客户端安装目录: {}", path.display()),
            None => warn!("未检测到客户端安装目录，共检查 {} 个位置", self.candidates.len()),
        }
        *self.detected.write() = found;
        Ok(())
    }
}

impl ComponentDefinition for ClientInstallation {
    const ID: ComponentId = ComponentId::from_static("client-installation");

    fn params() -> Vec<ParamSpec> {
        vec![ParamSpec::ConfigSlot]
    }

    fn construct(args: ComponentArgs) -> Result<Self, BoxError> {
        let options: InstallationOptions = args.config_or_default()?;
        Ok(Self {
            candidates: options.candidates,
            detected: RwLock::new(None),
        })
    }
}

/// 远程配置
#[derive(Debug)]
pub struct RemoteConfig {
    options: RemoteConfigOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfigOptions {
    pub preferred_source: String,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    600
}

impl RemoteConfig {
    pub fn source(&self) -> &str {
        &self.options.preferred_source
    }
}

#[async_trait]
impl Component for RemoteConfig {
    async fn on_init(&self) -> HookResult {
        info!(
            "远程配置源: {}, 刷新间隔 {} 秒",
            self.options.preferred_source, self.options.refresh_interval_secs
        );
        Ok(())
    }

    async fn on_dispose(&self) -> HookResult {
        info!("停止远程配置刷新");
        Ok(())
    }
}

impl ComponentDefinition for RemoteConfig {
    const ID: ComponentId = ComponentId::from_static("remote-config");
    const PRIORITY: i32 = 10;

    fn params() -> Vec<ParamSpec> {
        vec![ParamSpec::ConfigSlot]
    }

    fn construct(args: ComponentArgs) -> Result<Self, BoxError> {
        let options = args
            .config::<RemoteConfigOptions>()?
            .ok_or_else(|| BoxError::from("缺少 remote-config 配置"))?;
        Ok(Self { options })
    }
}

/// 自动更新
#[derive(Debug)]
pub struct SelfUpdate {
    remote: Arc<RemoteConfig>,
    installation: Arc<ClientInstallation>,
    options: UpdateOptions,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateOptions {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    check_interval_secs: u64,
}

#[async_trait]
impl Component for SelfUpdate {
    async fn on_finish(&self) -> HookResult {
        // 所有组件初始化完成后才开始检查更新
        info!(
            "开始检查更新: 通道 {}, 来源 {}, 间隔 {} 秒",
            self.options.channel,
            self.remote.source(),
            self.options.check_interval_secs
        );
        if self.installation.detected().is_none() {
            warn!("未找到客户端，跳过客户端相关的更新步骤");
        }
        Ok(())
    }

    async fn on_dispose(&self) -> HookResult {
        info!("取消更新检查");
        Ok(())
    }
}

impl ComponentDefinition for SelfUpdate {
    const ID: ComponentId = ComponentId::from_static("self-update");
    const PRIORITY: i32 = 1;

    fn params() -> Vec<ParamSpec> {
        vec![
            ParamSpec::dependency("remote-config"),
            ParamSpec::dependency("client-installation"),
            ParamSpec::ConfigSlot,
        ]
    }

    fn construct(args: ComponentArgs) -> Result<Self, BoxError> {
        Ok(Self {
            remote: args.dependency(0)?,
            installation: args.dependency(1)?,
            options: args.config_or_default()?,
        })
    }
}

/// 通知中心，通过共享上下文在运行时查找其他组件
#[derive(Debug)]
pub struct Notifications {
    context: Arc<SharedContext>,
}

impl Notifications {
    pub fn new(context: Arc<SharedContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Component for Notifications {
    async fn on_finish(&self) -> HookResult {
        let version = self
            .context
            .globals()
            .get::<String>("app.version")
            .map(|version| version.to_string())
            .unwrap_or_default();
        info!("欢迎使用 v{}", version);

        if self.context.get::<SelfUpdate>("self-update").is_some() {
            info!("自动更新已启用，发现新版本时将发送通知");
        }
        Ok(())
    }
}
