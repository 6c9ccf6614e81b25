//! 合成根
//!
//! 启动时临时注册的内部组件，依赖列表为“当前所有已注册组件”，
//! 使解析器从单一入口完成一次全图遍历。它的实例在解析后立即丢弃。

use crate::shared::SHARED_CONTEXT_ID;
use companion_common::{Component, ComponentId};
use companion_di_abstractions::ComponentDescriptor;

/// 合成根组件 ID
pub const SYNTHETIC_ROOT_ID: ComponentId = ComponentId::from_static("<composition-root>");

/// 是否为组合根内部保留的组件 ID
pub fn is_reserved_id(id: &ComponentId) -> bool {
    *id == SYNTHETIC_ROOT_ID || *id == SHARED_CONTEXT_ID
}

#[derive(Debug)]
struct CompositionRoot;

impl Component for CompositionRoot {}

/// 以给定依赖快照构建合成根描述符
pub(crate) fn root_descriptor(dependencies: Vec<ComponentId>) -> ComponentDescriptor {
    dependencies
        .into_iter()
        .fold(
            ComponentDescriptor::builder(SYNTHETIC_ROOT_ID).priority(i32::MIN),
            |builder, id| builder.depends_on(id),
        )
        .build(|_| Ok(CompositionRoot))
}
