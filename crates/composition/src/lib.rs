//! # 组合根装配层
//!
//! 在 [`companion_di::ComponentManager`] 之上提供面向应用入口的装配流程：
//! 安装日志订阅器、从 TOML/JSON 文件与环境变量加载各组件的静态配置、
//! 注册组件并执行启动，最终返回可查询、可关闭的 [`Composition`]。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use companion_common::Component;
//! use companion_composition::{CompositionBuilder, LoggingConfig};
//! use companion_di_abstractions::{ComponentDescriptor, ComponentLookup};
//!
//! #[derive(Debug)]
//! struct InstallationDetector;
//!
//! impl Component for InstallationDetector {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let composition = CompositionBuilder::new()
//!         .with_logging(LoggingConfig::development())
//!         .add_config_toml("./companion.toml")?
//!         .add_config_env_vars("COMPANION")
//!         .register(
//!             ComponentDescriptor::builder("installation-detector")
//!                 .build(|_| Ok(InstallationDetector)),
//!         )
//!         .build()
//!         .await?;
//!
//!     let detector = composition.get::<InstallationDetector>("installation-detector");
//!     assert!(detector.is_some());
//!
//!     composition.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod composition;
pub mod config_sources;

pub use builder::{CompositionBuilder, LoggingConfig};
pub use composition::Composition;
pub use config_sources::{ComponentConfigLoader, ComponentConfigs, ConfigSourceType};

pub use companion_common::CompositionError;
