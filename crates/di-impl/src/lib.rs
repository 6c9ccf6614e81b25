//! # 依赖注入具体实现
//!
//! 组合根的核心：描述符注册表、依赖解析器、实例表以及负责两阶段初始化与
//! 逆序销毁的 [`ComponentManager`]。
//!
//! ```rust,no_run
//! use companion_common::Component;
//! use companion_di::ComponentManager;
//! use companion_di_abstractions::{ComponentDescriptor, ComponentRegistry};
//!
//! #[derive(Debug)]
//! struct Logger;
//!
//! impl Component for Logger {}
//!
//! #[derive(Debug)]
//! struct RemoteConfig;
//!
//! impl Component for RemoteConfig {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut manager = ComponentManager::new();
//!     manager.register(ComponentDescriptor::builder("logger").build(|_| Ok(Logger)), None)?;
//!     manager.register(
//!         ComponentDescriptor::builder("remote-config")
//!             .depends_on("logger")
//!             .build(|_| Ok(RemoteConfig)),
//!         None,
//!     )?;
//!
//!     manager.setup().await?;
//!     assert_eq!(manager.initialization_order(), ["logger", "remote-config"]);
//!     manager.dispose().await?;
//!     Ok(())
//! }
//! ```

pub mod instances;
pub mod manager;
pub mod registry;
pub mod resolver;
pub mod root;
pub mod shared;

pub use instances::InstanceTable;
pub use manager::ComponentManager;
pub use registry::DescriptorRegistry;
pub use resolver::{DependencyResolver, ResolveContext};
pub use root::{is_reserved_id, SYNTHETIC_ROOT_ID};
pub use shared::{SetupCycle, SharedContext, SharedGlobals, SHARED_CONTEXT_ID};
