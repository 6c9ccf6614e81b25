//! 组件描述符
//!
//! 描述如何构建一个组件：ID、优先级、按位置排列的参数声明、工厂以及可选的静态配置。

use crate::factory::{component_factory, ComponentArgs, ComponentFactory};
use companion_common::{BoxError, Component, ComponentId, ConfigSection};
use std::fmt;

/// 构造参数声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSpec {
    /// 依赖另一个组件
    DependencyRef(ComponentId),
    /// 接收描述符上的静态配置（每个描述符至多一个）
    ConfigSlot,
    /// 空参数
    Empty,
}

impl ParamSpec {
    /// 依赖声明的简写
    pub fn dependency(id: impl Into<ComponentId>) -> Self {
        Self::DependencyRef(id.into())
    }

    pub fn dependency_id(&self) -> Option<&ComponentId> {
        match self {
            Self::DependencyRef(id) => Some(id),
            _ => None,
        }
    }
}

/// 组件描述符
#[derive(Clone)]
pub struct ComponentDescriptor {
    /// 组件 ID
    pub id: ComponentId,
    /// 组件优先级，数值越高越先解析
    pub priority: i32,
    /// 构造参数声明
    pub params: Vec<ParamSpec>,
    /// 组件工厂
    pub factory: ComponentFactory,
    /// 静态配置
    pub static_config: Option<ConfigSection>,
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("params", &self.params)
            .field("static_config", &self.static_config)
            .field("factory", &"<function>")
            .finish()
    }
}

impl ComponentDescriptor {
    /// 创建新的组件描述符
    pub fn new(
        id: impl Into<ComponentId>,
        priority: i32,
        params: Vec<ParamSpec>,
        factory: ComponentFactory,
    ) -> Self {
        Self {
            id: id.into(),
            priority,
            params,
            factory,
            static_config: None,
        }
    }

    /// 使用构建器创建描述符
    pub fn builder(id: impl Into<ComponentId>) -> DescriptorBuilder {
        DescriptorBuilder::new(id)
    }

    /// 设置静态配置
    pub fn with_static_config(mut self, config: ConfigSection) -> Self {
        self.static_config = Some(config);
        self
    }

    /// 按声明顺序列出依赖的组件 ID
    pub fn dependency_ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.params.iter().filter_map(ParamSpec::dependency_id)
    }

    pub fn config_slot_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| matches!(p, ParamSpec::ConfigSlot))
            .count()
    }

    pub fn has_config_slot(&self) -> bool {
        self.config_slot_count() > 0
    }
}

/// 描述符构建器
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    id: ComponentId,
    priority: i32,
    params: Vec<ParamSpec>,
}

impl DescriptorBuilder {
    pub fn new(id: impl Into<ComponentId>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            params: Vec::new(),
        }
    }

    /// 设置优先级
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 追加一个依赖参数
    pub fn depends_on(mut self, id: impl Into<ComponentId>) -> Self {
        self.params.push(ParamSpec::dependency(id));
        self
    }

    /// 追加配置参数
    pub fn config_slot(mut self) -> Self {
        self.params.push(ParamSpec::ConfigSlot);
        self
    }

    /// 追加空参数
    pub fn empty(mut self) -> Self {
        self.params.push(ParamSpec::Empty);
        self
    }

    /// 追加任意参数声明
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// 使用返回具体组件类型的工厂完成构建
    pub fn build<T, F>(self, factory: F) -> ComponentDescriptor
    where
        T: Component,
        F: Fn(ComponentArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.build_with(component_factory(factory))
    }

    /// 使用已擦除类型的工厂完成构建
    pub fn build_with(self, factory: ComponentFactory) -> ComponentDescriptor {
        ComponentDescriptor::new(self.id, self.priority, self.params, factory)
    }
}

/// 组件定义 trait
///
/// 组件类型通过关联常量声明 ID 与优先级，并提供纯函数式的描述符构建，
/// 在启动流程中显式调用注册。
pub trait ComponentDefinition: Component + Sized {
    /// 组件 ID
    const ID: ComponentId;

    /// 组件优先级，数值越高优先级越高
    const PRIORITY: i32 = 0;

    /// 构造参数声明，顺序与 [`construct`](Self::construct) 读取参数的顺序一致
    fn params() -> Vec<ParamSpec> {
        Vec::new()
    }

    /// 使用解析好的参数构造组件
    fn construct(args: ComponentArgs) -> Result<Self, BoxError>;

    /// 生成组件描述符
    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new(
            Self::ID,
            Self::PRIORITY,
            Self::params(),
            component_factory(Self::construct),
        )
    }
}
