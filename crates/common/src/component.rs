//! 组件基础接口定义
//!
//! 提供组件标识、生命周期钩子以及实例的类型擦除与向下转换

use crate::errors::BoxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::{Borrow, Cow};
use std::fmt;
use std::sync::Arc;

/// 组件唯一标识
///
/// 在注册表生命周期内保持稳定，可哈希、可比较。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(Cow<'static, str>);

impl ComponentId {
    /// 从静态字符串创建标识（可用于常量）
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// 创建新的标识
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ComponentId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl From<&ComponentId> for ComponentId {
    fn from(id: &ComponentId) -> Self {
        id.clone()
    }
}

impl PartialEq<str> for ComponentId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ComponentId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ComponentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// 钩子执行结果
pub type HookResult = Result<(), BoxError>;

/// 将 `Arc<Self>` 擦除为 `Arc<dyn Any>`，用于实例的类型化访问
pub trait AsAnyArc: Any + Send + Sync {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 组件基础 trait
///
/// 所有注册到组合根的组件都必须实现此 trait。三个生命周期钩子均为可选，
/// 默认实现不做任何事情。实例会被多个依赖方共享，因此钩子只拿到 `&self`，
/// 需要可变状态的组件自行使用内部可变性。
#[async_trait]
pub trait Component: AsAnyArc + fmt::Debug {
    /// 初始化钩子，按初始化顺序依次执行
    async fn on_init(&self) -> HookResult {
        Ok(())
    }

    /// 收尾钩子，在所有组件完成初始化后按同一顺序执行
    async fn on_finish(&self) -> HookResult {
        Ok(())
    }

    /// 销毁钩子，按初始化顺序的逆序执行
    async fn on_dispose(&self) -> HookResult {
        Ok(())
    }
}

/// 类型擦除后的组件实例
pub type ComponentInstance = Arc<dyn Component>;

/// 将组件实例向下转换为具体类型
pub fn downcast_instance<T: Component>(instance: &ComponentInstance) -> Option<Arc<T>> {
    AsAnyArc::into_any_arc(Arc::clone(instance))
        .downcast::<T>()
        .ok()
}
