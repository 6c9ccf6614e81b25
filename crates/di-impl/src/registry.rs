//! 描述符注册表实现

use crate::root::{is_reserved_id, SYNTHETIC_ROOT_ID};
use companion_common::{ComponentId, ConfigSection, RegistrationError, RegistrationResult};
use companion_di_abstractions::{ComponentDescriptor, ComponentRegistry};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 描述符注册表
///
/// 只允许追加的 `ComponentId -> ComponentDescriptor` 映射，同时记录注册顺序，
/// 使合成根的依赖列表（进而整个初始化顺序）是确定的。
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: HashMap<ComponentId, ComponentDescriptor>,
    registration_order: Vec<ComponentId>,
}

impl DescriptorRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 按注册顺序列出所有组件 ID
    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.registration_order.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// 校验描述符，不修改注册表
    fn validate(&self, descriptor: &ComponentDescriptor) -> RegistrationResult<()> {
        if is_reserved_id(&descriptor.id) {
            return Err(RegistrationError::ReservedId {
                id: descriptor.id.clone(),
            });
        }

        if self.descriptors.contains_key(&descriptor.id) {
            return Err(RegistrationError::DuplicateId {
                id: descriptor.id.clone(),
            });
        }

        // 合成根不能被依赖；共享上下文可以
        if descriptor
            .dependency_ids()
            .any(|dependency| *dependency == SYNTHETIC_ROOT_ID)
        {
            return Err(RegistrationError::ReservedId {
                id: SYNTHETIC_ROOT_ID,
            });
        }

        let count = descriptor.config_slot_count();
        if count > 1 {
            return Err(RegistrationError::MultipleConfigSlots {
                id: descriptor.id.clone(),
                count,
            });
        }

        Ok(())
    }

    /// 写入内部组件（共享上下文、合成根），跳过保留 ID 校验，已存在时覆盖
    pub(crate) fn insert_internal(&mut self, descriptor: ComponentDescriptor) {
        let id = descriptor.id.clone();
        if self.descriptors.insert(id.clone(), descriptor).is_none() {
            self.registration_order.push(id);
        }
    }

    /// 移除内部组件
    pub(crate) fn remove_internal(&mut self, id: &ComponentId) {
        if self.descriptors.remove(id).is_some() {
            self.registration_order.retain(|registered| registered != id);
        }
    }
}

impl ComponentRegistry for DescriptorRegistry {
    fn register(
        &mut self,
        mut descriptor: ComponentDescriptor,
        config: Option<ConfigSection>,
    ) -> RegistrationResult<()> {
        self.validate(&descriptor)?;

        if let Some(config) = config {
            if !descriptor.has_config_slot() {
                warn!(
                    "组件 {} 未声明配置参数，配置仅可通过 static_config 读取",
                    descriptor.id
                );
            }
            descriptor.static_config = Some(config);
        }

        info!(
            "注册组件: {} (优先级 {}, 依赖 {} 个)",
            descriptor.id,
            descriptor.priority,
            descriptor.dependency_ids().count()
        );
        debug!("组件描述符: {:?}", descriptor);

        let id = descriptor.id.clone();
        self.descriptors.insert(id.clone(), descriptor);
        self.registration_order.push(id);
        Ok(())
    }

    fn lookup(&self, id: &str) -> Option<&ComponentDescriptor> {
        self.descriptors.get(id)
    }
}
