//! 组合根构建器

use crate::composition::Composition;
use crate::config_sources::{ComponentConfigLoader, ComponentConfigs};
use companion_common::{ComponentId, CompositionError, CompositionResult, ConfigSection};
use companion_di::{ComponentManager, SharedGlobals};
use companion_di_abstractions::{
    ComponentDefinition, ComponentDescriptor, ComponentFactory, ComponentRegistry, ParamSpec,
};
use std::any::Any;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// 待注册的组件
struct PendingRegistration {
    descriptor: ComponentDescriptor,
    config: Option<ConfigSection>,
    /// 外部组件的配置直接写入描述符，不经过配置参数
    external: bool,
}

/// 组合根构建器
///
/// 收集配置源与组件注册，`build` 时加载配置、完成注册并执行启动。
/// 显式传入的组件配置优先于配置源中的同名配置。
pub struct CompositionBuilder {
    /// 组件配置源
    config_loader: ComponentConfigLoader,
    /// 待注册组件，按添加顺序注册
    registrations: Vec<PendingRegistration>,
    /// 进程级共享存储
    globals: SharedGlobals,
    /// 启动超时
    setup_timeout: Option<Duration>,
    /// 销毁超时
    dispose_timeout: Option<Duration>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl CompositionBuilder {
    /// 创建新的组合根构建器
    pub fn new() -> Self {
        Self {
            config_loader: ComponentConfigLoader::new(),
            registrations: Vec::new(),
            globals: SharedGlobals::new(),
            setup_timeout: None,
            dispose_timeout: None,
            logging_enabled: false, // 默认不初始化日志，避免测试中重复安装
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加 TOML 配置文件
    pub fn add_config_toml<P: AsRef<Path>>(mut self, path: P) -> CompositionResult<Self> {
        info!("添加 TOML 配置文件: {}", path.as_ref().display());
        self.config_loader.add_toml_file(path)?;
        Ok(self)
    }

    /// 添加 JSON 配置文件
    pub fn add_config_json<P: AsRef<Path>>(mut self, path: P) -> CompositionResult<Self> {
        info!("添加 JSON 配置文件: {}", path.as_ref().display());
        self.config_loader.add_json_file(path)?;
        Ok(self)
    }

    /// 添加环境变量配置源
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.config_loader.add_environment(prefix);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 设置启动超时，覆盖解析与全部 `on_init`、`on_finish` 钩子
    pub fn with_setup_timeout(mut self, timeout: Duration) -> Self {
        self.setup_timeout = Some(timeout);
        self
    }

    /// 设置销毁超时
    pub fn with_dispose_timeout(mut self, timeout: Duration) -> Self {
        self.dispose_timeout = Some(timeout);
        self
    }

    /// 写入进程级共享值，组件可通过共享上下文读取
    pub fn with_global<T: Any + Send + Sync>(self, key: impl Into<String>, value: T) -> Self {
        self.globals.insert(key, value);
        self
    }

    /// 使用外部持有的共享存储
    pub fn with_globals(mut self, globals: SharedGlobals) -> Self {
        self.globals = globals;
        self
    }

    /// 注册组件描述符，配置从配置源中按组件 ID 查找
    pub fn register(self, descriptor: ComponentDescriptor) -> Self {
        self.push(descriptor, None, false)
    }

    /// 注册组件描述符并显式指定配置
    pub fn register_with_config(
        self,
        descriptor: ComponentDescriptor,
        config: impl Into<ConfigSection>,
    ) -> Self {
        self.push(descriptor, Some(config.into()), false)
    }

    /// 注册实现了 [`ComponentDefinition`] 的组件类型
    pub fn register_component<T: ComponentDefinition>(self) -> Self {
        self.push(T::descriptor(), None, false)
    }

    /// 注册显式声明依赖列表的外部组件
    pub fn register_external(
        self,
        id: impl Into<ComponentId>,
        priority: Option<i32>,
        dependencies: Vec<ComponentId>,
        factory: ComponentFactory,
    ) -> Self {
        let params = dependencies
            .into_iter()
            .map(ParamSpec::DependencyRef)
            .collect();
        let descriptor =
            ComponentDescriptor::new(id, priority.unwrap_or_default(), params, factory);
        self.push(descriptor, None, true)
    }

    fn push(
        mut self,
        descriptor: ComponentDescriptor,
        config: Option<ConfigSection>,
        external: bool,
    ) -> Self {
        debug!("添加组件: {}", descriptor.id);
        self.registrations.push(PendingRegistration {
            descriptor,
            config,
            external,
        });
        self
    }

    /// 加载配置、注册组件并启动组合根
    pub async fn build(self) -> CompositionResult<Composition> {
        if self.logging_enabled {
            self.logging_config.init()?;
        }

        info!("开始构建组合根");

        let configs = self.config_loader.load()?;
        let mut manager = ComponentManager::with_globals(self.globals);
        register_all(&mut manager, self.registrations, &configs)?;

        run_with_timeout("setup", self.setup_timeout, manager.setup()).await?;

        info!(
            "组合根构建完成，共 {} 个组件",
            manager.initialization_order().len()
        );
        Ok(Composition::new(manager, configs, self.dispose_timeout))
    }
}

impl Default for CompositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn register_all(
    manager: &mut ComponentManager,
    registrations: Vec<PendingRegistration>,
    configs: &ComponentConfigs,
) -> CompositionResult<()> {
    for PendingRegistration {
        mut descriptor,
        config,
        external,
    } in registrations
    {
        let config = config.or_else(|| configs.section(descriptor.id.as_str()).cloned());

        if external {
            descriptor.static_config = config;
            manager.register(descriptor, None)?;
        } else {
            manager.register(descriptor, config)?;
        }
    }

    for id in configs.ids() {
        let registered = manager.contains(id) || manager.contains(&id.replace('_', "-"));
        if !registered {
            warn!("配置节 {} 没有对应的组件", id);
        }
    }

    Ok(())
}

/// 在可选超时内执行生命周期过程
pub(crate) async fn run_with_timeout<T, E>(
    stage: &'static str,
    timeout: Option<Duration>,
    pass: impl Future<Output = Result<T, E>>,
) -> CompositionResult<T>
where
    CompositionError: From<E>,
{
    let Some(timeout) = timeout else {
        return Ok(pass.await?);
    };

    match tokio::time::timeout(timeout, pass).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            warn!("{} 超时: {:?}", stage, timeout);
            Err(CompositionError::Timeout {
                stage,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }
}

/// 组合根的日志输出方式
///
/// 设置了 `RUST_LOG` 时过滤规则以环境变量为准，`level` 只作缺省值。
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: tracing::Level,
    pub with_target: bool,
    pub with_thread_ids: bool,
    /// 输出文件名与行号
    pub with_source_location: bool,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            with_target: true,
            with_thread_ids: false,
            with_source_location: false,
            json: false,
        }
    }
}

impl LoggingConfig {
    /// 本地调试：DEBUG 级别，带线程与源码位置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            with_thread_ids: true,
            with_source_location: true,
            ..Self::default()
        }
    }

    /// 部署环境：JSON 行输出，便于采集
    pub fn production() -> Self {
        Self {
            with_target: false,
            json: true,
            ..Self::default()
        }
    }

    /// 安装全局日志订阅器
    pub fn init(&self) -> CompositionResult<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.with_target)
            .with_thread_ids(self.with_thread_ids)
            .with_file(self.with_source_location)
            .with_line_number(self.with_source_location);

        if self.json {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| CompositionError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
