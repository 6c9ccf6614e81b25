//! 共享上下文
//!
//! 每次启动前由组合根直接创建并写入实例表的内部单例，没有任何依赖。
//! 声明依赖它的组件可以在运行时按 ID 查找任意其他组件，而无需为此添加静态依赖边。

use crate::instances::InstanceTable;
use chrono::{DateTime, Utc};
use companion_common::{BoxError, Component, ComponentId, ComponentInstance};
use companion_di_abstractions::{ComponentArgs, ComponentDescriptor, ComponentLookup};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// 共享上下文组件 ID
pub const SHARED_CONTEXT_ID: ComponentId = ComponentId::from_static("<shared-context>");

/// 一次启动周期的标识
#[derive(Debug, Clone)]
pub struct SetupCycle {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl SetupCycle {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

impl Default for SetupCycle {
    fn default() -> Self {
        Self::new()
    }
}

/// 进程级共享键值存储
///
/// 跨启动周期保留，用于存放应用版本、主窗口句柄之类的环境值。
#[derive(Clone, Default)]
pub struct SharedGlobals {
    values: Arc<DashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl SharedGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入值，返回是否覆盖了旧值
    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> bool {
        self.values.insert(key.into(), Arc::new(value)).is_some()
    }

    /// 读取值并转换为具体类型，类型不匹配时返回 `None`
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.values.get(key).map(|entry| Arc::clone(entry.value()))?;
        value.downcast::<T>().ok()
    }

    pub fn remove(&self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl fmt::Debug for SharedGlobals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedGlobals")
            .field("keys", &self.keys())
            .finish()
    }
}

/// 共享上下文
///
/// 持有组合根实例表的弱引用。组件构造期间实例表尚未发布，查找总是返回 `None`；
/// 从 `on_init` 开始即可查到所有已构造的组件。
pub struct SharedContext {
    instances: Weak<RwLock<InstanceTable>>,
    globals: SharedGlobals,
    cycle: SetupCycle,
}

impl SharedContext {
    pub(crate) fn new(
        instances: Weak<RwLock<InstanceTable>>,
        globals: SharedGlobals,
        cycle: SetupCycle,
    ) -> Self {
        Self {
            instances,
            globals,
            cycle,
        }
    }

    /// 进程级共享键值存储
    pub fn globals(&self) -> &SharedGlobals {
        &self.globals
    }

    /// 当前启动周期
    pub fn cycle(&self) -> &SetupCycle {
        &self.cycle
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("cycle", &self.cycle)
            .field("globals", &self.globals)
            .finish()
    }
}

impl Component for SharedContext {}

impl ComponentLookup for SharedContext {
    fn get_instance(&self, id: &str) -> Option<ComponentInstance> {
        let instances = self.instances.upgrade()?;
        let table = instances.read();
        table.get(id).cloned()
    }
}

/// 共享上下文描述符，工厂直接返回已创建的实例
pub(crate) fn shared_context_descriptor(context: Arc<SharedContext>) -> ComponentDescriptor {
    ComponentDescriptor::new(
        SHARED_CONTEXT_ID,
        i32::MIN,
        Vec::new(),
        Arc::new(move |_: ComponentArgs| {
            Ok::<_, BoxError>(Arc::clone(&context) as ComponentInstance)
        }),
    )
}
