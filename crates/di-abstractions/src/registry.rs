//! 组件注册表与实例查找抽象接口

use crate::descriptor::{ComponentDefinition, ComponentDescriptor, ParamSpec};
use crate::factory::ComponentFactory;
use companion_common::{
    downcast_instance, Component, ComponentId, ComponentInstance, ConfigSection,
    RegistrationResult,
};
use std::sync::Arc;

/// 组件注册表 trait
///
/// 注册表只允许追加；ID 重复时注册失败且不产生任何副作用。
pub trait ComponentRegistry {
    /// 注册组件描述符
    ///
    /// 若描述符声明了配置参数，`config` 会作为其静态配置保存。
    fn register(
        &mut self,
        descriptor: ComponentDescriptor,
        config: Option<ConfigSection>,
    ) -> RegistrationResult<()>;

    /// 查找组件描述符
    fn lookup(&self, id: &str) -> Option<&ComponentDescriptor>;

    /// 检查组件是否已注册
    fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    /// 注册显式声明依赖列表的外部组件
    ///
    /// 每个依赖 ID 按顺序成为一个依赖参数，未指定优先级时为 0。
    fn register_external(
        &mut self,
        id: impl Into<ComponentId>,
        priority: Option<i32>,
        dependencies: Vec<ComponentId>,
        factory: ComponentFactory,
        config: Option<ConfigSection>,
    ) -> RegistrationResult<()>
    where
        Self: Sized,
    {
        let params = dependencies
            .into_iter()
            .map(ParamSpec::DependencyRef)
            .collect();
        let mut descriptor =
            ComponentDescriptor::new(id, priority.unwrap_or_default(), params, factory);
        descriptor.static_config = config;
        self.register(descriptor, None)
    }

    /// 注册实现了 [`ComponentDefinition`] 的组件类型
    fn register_component<T>(&mut self, config: Option<ConfigSection>) -> RegistrationResult<()>
    where
        T: ComponentDefinition,
        Self: Sized,
    {
        self.register(T::descriptor(), config)
    }
}

/// 组件实例查找 trait
pub trait ComponentLookup {
    /// 按 ID 获取组件实例
    fn get_instance(&self, id: &str) -> Option<ComponentInstance>;

    /// 按 ID 获取组件实例并转换为具体类型
    fn get<T: Component>(&self, id: &str) -> Option<Arc<T>>
    where
        Self: Sized,
    {
        self.get_instance(id)
            .and_then(|instance| downcast_instance::<T>(&instance))
    }
}
