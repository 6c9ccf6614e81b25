//! 依赖解析器
//!
//! 从给定的根组件出发做深度优先遍历：先解析依赖、后构造自身，
//! 由此得到“依赖总在依赖方之前”的初始化顺序，同时检测循环依赖与缺失依赖。

use crate::instances::InstanceTable;
use crate::registry::DescriptorRegistry;
use companion_common::{ComponentId, ComponentInstance, DependencyError, DependencyResult};
use companion_di_abstractions::{
    ComponentArg, ComponentArgs, ComponentDescriptor, ComponentRegistry, ParamSpec,
};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// 解析上下文
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前递归路径，用于检测循环依赖
    visiting: Vec<ComponentId>,
    /// 已确定的初始化顺序
    order: Vec<ComponentId>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visiting(&self, id: &ComponentId) -> bool {
        self.visiting.contains(id)
    }

    pub fn visiting(&self) -> &[ComponentId] {
        &self.visiting
    }

    pub fn order(&self) -> &[ComponentId] {
        &self.order
    }

    pub fn into_order(self) -> Vec<ComponentId> {
        self.order
    }

    /// 将依赖加入递归路径，已在路径中时返回完整的循环路径
    fn enter(&mut self, id: &ComponentId) -> DependencyResult<()> {
        if self.is_visiting(id) {
            let mut path = self.visiting.clone();
            path.push(id.clone());
            return Err(DependencyError::CircularDependency { path });
        }
        self.visiting.push(id.clone());
        Ok(())
    }

    fn leave(&mut self) {
        self.visiting.pop();
    }
}

/// 依赖解析器
///
/// 只读访问注册表，独占写入实例表。
pub struct DependencyResolver<'a> {
    registry: &'a DescriptorRegistry,
    instances: &'a mut InstanceTable,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a DescriptorRegistry, instances: &'a mut InstanceTable) -> Self {
        Self {
            registry,
            instances,
        }
    }

    /// 从根组件开始解析，返回根实例与覆盖全部可达组件的初始化顺序
    pub fn resolve_root(
        &mut self,
        root: &ComponentId,
    ) -> DependencyResult<(ComponentInstance, Vec<ComponentId>)> {
        let mut context = ResolveContext::new();
        let instance = self.resolve(root, &mut context)?;
        debug_assert!(context.visiting().is_empty());
        Ok((instance, context.into_order()))
    }

    /// 解析单个组件：递归解析其依赖、记录顺序、调用工厂并写入实例表
    pub fn resolve(
        &mut self,
        id: &ComponentId,
        context: &mut ResolveContext,
    ) -> DependencyResult<ComponentInstance> {
        let registry = self.registry;
        let descriptor = registry
            .lookup(id.as_str())
            .ok_or_else(|| DependencyError::UnregisteredDependency { id: id.clone() })?;

        let dependencies = self.sorted_dependencies(descriptor)?;

        let mut resolved: HashMap<&ComponentId, ComponentInstance> = HashMap::new();
        for dependency in dependencies {
            if let Err(err) = context.enter(dependency) {
                error!("{}", err);
                return Err(err);
            }

            let instance = match self.instances.get(dependency.as_str()).cloned() {
                Some(existing) => existing,
                None => self.resolve(dependency, context)?,
            };
            context.leave();

            resolved.insert(dependency, instance);
        }

        context.order.push(id.clone());

        let args = descriptor
            .params
            .iter()
            .map(|param| match param {
                ParamSpec::DependencyRef(dependency) => resolved
                    .get(dependency)
                    .map(|instance| ComponentArg::Dependency {
                        id: dependency.clone(),
                        instance: Arc::clone(instance),
                    })
                    .ok_or_else(|| DependencyError::UnregisteredDependency {
                        id: dependency.clone(),
                    }),
                ParamSpec::ConfigSlot => Ok(ComponentArg::Config(descriptor.static_config.clone())),
                ParamSpec::Empty => Ok(ComponentArg::Empty),
            })
            .collect::<DependencyResult<Vec<_>>>()?;

        debug!("构造组件: {}", id);
        let args = ComponentArgs::new(id.clone(), args, descriptor.static_config.clone());
        let instance = (descriptor.factory)(args).map_err(|source| {
            error!("组件构造失败: {}, 原因: {}", id, source);
            DependencyError::ConstructionFailed {
                id: id.clone(),
                source,
            }
        })?;

        self.instances.insert(id.clone(), Arc::clone(&instance));
        Ok(instance)
    }

    /// 校验依赖均已注册，并按被依赖组件的优先级降序稳定排序
    fn sorted_dependencies(
        &self,
        descriptor: &'a ComponentDescriptor,
    ) -> DependencyResult<Vec<&'a ComponentId>> {
        let mut dependencies = descriptor
            .dependency_ids()
            .map(|dependency| {
                self.registry
                    .lookup(dependency.as_str())
                    .map(|target| (dependency, target.priority))
                    .ok_or_else(|| {
                        error!("组件 {} 依赖的组件未注册: {}", descriptor.id, dependency);
                        DependencyError::UnregisteredDependency {
                            id: dependency.clone(),
                        }
                    })
            })
            .collect::<DependencyResult<Vec<_>>>()?;

        dependencies.sort_by_key(|&(_, priority)| Reverse(priority));
        Ok(dependencies.into_iter().map(|(id, _)| id).collect())
    }
}
