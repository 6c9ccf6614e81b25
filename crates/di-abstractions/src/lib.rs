//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件描述符、构造参数以及注册与查找的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentDescriptor`] - 组件描述符（ID、优先级、参数声明、工厂、静态配置）
//! - [`ParamSpec`] - 构造参数声明
//! - [`ComponentDefinition`] - 组件类型自带的描述符构建器
//! - [`ComponentArgs`] - 传递给工厂的按位置排列的构造参数
//! - [`ComponentRegistry`] - 组件注册表接口
//! - [`ComponentLookup`] - 按 ID 查找组件实例的接口

pub mod descriptor;
pub mod factory;
pub mod registry;

pub use descriptor::*;
pub use factory::*;
pub use registry::*;
