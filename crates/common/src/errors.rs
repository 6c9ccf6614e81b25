//! 错误类型定义

use crate::component::ComponentId;
use crate::lifecycle::HookStage;
use std::fmt;
use thiserror::Error;

/// 组件工厂与生命周期钩子使用的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 组件注册错误类型
///
/// 注册失败时注册表保持不变。
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("组件 ID 已存在: {id}")]
    DuplicateId { id: ComponentId },

    #[error("组件 ID 为内部保留标识: {id}")]
    ReservedId { id: ComponentId },

    #[error("组件声明了多个配置参数: {id}, 数量: {count}")]
    MultipleConfigSlots { id: ComponentId, count: usize },

    #[error("组合根已启动，无法再注册组件: {id}")]
    RegistryLocked { id: ComponentId },
}

/// 依赖解析错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {id}")]
    UnregisteredDependency { id: ComponentId },

    #[error("检测到循环依赖: {}", format_path(.path))]
    CircularDependency { path: Vec<ComponentId> },

    #[error("组件构造失败: {id}, 原因: {source}")]
    ConstructionFailed { id: ComponentId, source: BoxError },
}

impl DependencyError {
    /// 循环依赖路径（仅 `CircularDependency` 有值）
    pub fn cycle_path(&self) -> Option<&[ComponentId]> {
        match self {
            Self::CircularDependency { path } => Some(path),
            _ => None,
        }
    }

    /// 出错的组件 ID
    pub fn component_id(&self) -> Option<&ComponentId> {
        match self {
            Self::UnregisteredDependency { id } | Self::ConstructionFailed { id, .. } => Some(id),
            Self::CircularDependency { path } => path.last(),
        }
    }
}

/// 单个钩子的失败记录
#[derive(Debug)]
pub struct HookFailure {
    pub id: ComponentId,
    pub stage: HookStage,
    pub source: BoxError,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.id, self.stage, self.source)
    }
}

/// 生命周期管理错误类型
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("组合根已启动")]
    AlreadySetup,

    #[error("组合根尚未启动")]
    NotSetup,

    #[error("组件 {id} 的 {stage} 钩子执行失败: {source}")]
    Hook {
        stage: HookStage,
        id: ComponentId,
        source: BoxError,
    },

    #[error("销毁过程中有 {} 个组件钩子执行失败: {}", .failures.len(), format_failures(.failures))]
    DisposeFailed { failures: Vec<HookFailure> },
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置加载失败: {source}")]
    LoadError { source: BoxError },

    #[error("配置绑定失败: {source}")]
    BindError { source: serde_json::Error },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置格式无效: {message}")]
    InvalidFormat { message: String },
}

/// 组合根错误类型
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("组件注册错误: {source}")]
    Registration {
        #[from]
        source: RegistrationError,
    },

    #[error("依赖解析错误: {source}")]
    Dependency {
        #[from]
        source: DependencyError,
    },

    #[error("生命周期错误: {source}")]
    Lifecycle {
        #[from]
        source: LifecycleError,
    },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("{stage} 超时 ({timeout_ms} ms)")]
    Timeout { stage: &'static str, timeout_ms: u64 },

    #[error("组合根启动失败: {message}")]
    BootstrapFailed { message: String },
}

fn format_path(path: &[ComponentId]) -> String {
    path.iter()
        .map(ComponentId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_failures(failures: &[HookFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 结果类型别名
pub type RegistrationResult<T> = Result<T, RegistrationError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type CompositionResult<T> = Result<T, CompositionError>;
