//! 实例表

use companion_common::{downcast_instance, Component, ComponentId, ComponentInstance};
use companion_di_abstractions::ComponentLookup;
use std::collections::HashMap;
use std::sync::Arc;

/// 实例表
///
/// 持有一次启动周期内构造的全部组件实例。启动前为空，启动成功后完整，
/// 销毁时整体清空。
#[derive(Debug, Default)]
pub struct InstanceTable {
    instances: HashMap<ComponentId, ComponentInstance>,
}

impl InstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&ComponentInstance> {
        self.instances.get(id)
    }

    /// 获取实例并转换为具体类型
    pub fn get_as<T: Component>(&self, id: &str) -> Option<Arc<T>> {
        self.instances.get(id).and_then(downcast_instance::<T>)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    /// 写入实例，返回被替换的旧实例
    pub fn insert(
        &mut self,
        id: ComponentId,
        instance: ComponentInstance,
    ) -> Option<ComponentInstance> {
        self.instances.insert(id, instance)
    }

    pub fn remove(&mut self, id: &str) -> Option<ComponentInstance> {
        self.instances.remove(id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }
}

impl ComponentLookup for InstanceTable {
    fn get_instance(&self, id: &str) -> Option<ComponentInstance> {
        self.instances.get(id).cloned()
    }
}
