//! # Companion Common
//!
//! 组合根各层共享的基础类型。
//!
//! ## 核心内容
//!
//! - [`ComponentId`] - 组件唯一标识
//! - [`Component`] - 组件生命周期钩子 trait
//! - [`ManagerState`] - 组合根状态机
//! - [`ConfigSection`] - 组件静态配置
//! - 错误类型: [`RegistrationError`]、[`DependencyError`]、[`LifecycleError`]、[`CompositionError`]

pub mod component;
pub mod configuration;
pub mod errors;
pub mod lifecycle;

pub use component::*;
pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
