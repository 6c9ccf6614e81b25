//! 已启动的组合根

use crate::builder::{run_with_timeout, CompositionBuilder};
use crate::config_sources::ComponentConfigs;
use companion_common::{ComponentId, ComponentInstance, CompositionResult, ConfigSection, ManagerState};
use companion_di::{ComponentManager, SetupCycle, SharedGlobals};
use companion_di_abstractions::ComponentLookup;
use std::time::Duration;
use tracing::info;

/// 已启动的组合根
///
/// 由 [`CompositionBuilder::build`] 返回，持有全部组件实例直到 `shutdown`。
#[derive(Debug)]
pub struct Composition {
    manager: ComponentManager,
    configs: ComponentConfigs,
    dispose_timeout: Option<Duration>,
}

impl Composition {
    /// 创建组合根构建器
    pub fn builder() -> CompositionBuilder {
        CompositionBuilder::new()
    }

    pub(crate) fn new(
        manager: ComponentManager,
        configs: ComponentConfigs,
        dispose_timeout: Option<Duration>,
    ) -> Self {
        Self {
            manager,
            configs,
            dispose_timeout,
        }
    }

    pub fn initialization_order(&self) -> &[ComponentId] {
        self.manager.initialization_order()
    }

    pub fn state(&self) -> ManagerState {
        self.manager.state()
    }

    pub fn globals(&self) -> &SharedGlobals {
        self.manager.globals()
    }

    pub fn cycle(&self) -> Option<&SetupCycle> {
        self.manager.cycle()
    }

    /// 从配置源加载的组件配置
    pub fn config(&self, id: &str) -> Option<&ConfigSection> {
        self.configs.section(id)
    }

    pub fn manager(&self) -> &ComponentManager {
        &self.manager
    }

    /// 逆序销毁所有组件
    pub async fn shutdown(mut self) -> CompositionResult<()> {
        info!("开始关闭组合根");
        run_with_timeout("dispose", self.dispose_timeout, self.manager.dispose()).await?;
        info!("组合根已关闭");
        Ok(())
    }
}

impl ComponentLookup for Composition {
    fn get_instance(&self, id: &str) -> Option<ComponentInstance> {
        self.manager.get_instance(id)
    }
}
