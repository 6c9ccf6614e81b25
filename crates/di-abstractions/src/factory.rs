//! 组件工厂与构造参数
//!
//! 工厂接收与 [`ParamSpec`](crate::ParamSpec) 声明顺序一致的位置参数，返回组件实例。

use companion_common::{
    downcast_instance, BoxError, Component, ComponentId, ComponentInstance, ConfigError,
    ConfigSection,
};
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::sync::Arc;
use thiserror::Error;

/// 组件工厂函数类型
pub type ComponentFactory =
    Arc<dyn Fn(ComponentArgs) -> Result<ComponentInstance, BoxError> + Send + Sync>;

/// 将返回具体组件类型的闭包包装为 [`ComponentFactory`]
pub fn component_factory<T, F>(factory: F) -> ComponentFactory
where
    T: Component,
    F: Fn(ComponentArgs) -> Result<T, BoxError> + Send + Sync + 'static,
{
    Arc::new(move |args| factory(args).map(|component| Arc::new(component) as ComponentInstance))
}

/// 单个构造参数
#[derive(Debug, Clone)]
pub enum ComponentArg {
    /// 已解析的依赖实例
    Dependency {
        id: ComponentId,
        instance: ComponentInstance,
    },
    /// 描述符上的静态配置（可能为空）
    Config(Option<ConfigSection>),
    /// 空参数
    Empty,
}

/// 构造参数读取错误
#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("组件 {component} 的第 {index} 个参数不存在，共 {len} 个参数")]
    IndexOutOfRange {
        component: ComponentId,
        index: usize,
        len: usize,
    },

    #[error("组件 {component} 的第 {index} 个参数不是依赖")]
    NotADependency { component: ComponentId, index: usize },

    #[error("组件 {component} 未声明依赖 {dependency}")]
    MissingDependency {
        component: ComponentId,
        dependency: ComponentId,
    },

    #[error("组件 {component} 的依赖 {dependency} 类型不匹配, 期望 {expected}")]
    TypeMismatch {
        component: ComponentId,
        dependency: ComponentId,
        expected: &'static str,
    },

    #[error("组件 {component} 的配置绑定失败: {source}")]
    Config {
        component: ComponentId,
        source: ConfigError,
    },
}

/// 传递给工厂的构造参数
#[derive(Debug, Clone)]
pub struct ComponentArgs {
    component: ComponentId,
    args: Vec<ComponentArg>,
    static_config: Option<ConfigSection>,
}

impl ComponentArgs {
    /// 创建新的构造参数
    pub fn new(
        component: ComponentId,
        args: Vec<ComponentArg>,
        static_config: Option<ConfigSection>,
    ) -> Self {
        Self {
            component,
            args,
            static_config,
        }
    }

    /// 正在构造的组件 ID
    pub fn component_id(&self) -> &ComponentId {
        &self.component
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ComponentArg> {
        self.args.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentArg> {
        self.args.iter()
    }

    /// 取出第 `index` 个参数的依赖实例（未转换类型）
    pub fn instance(&self, index: usize) -> Result<ComponentInstance, ArgumentError> {
        match self.args.get(index) {
            Some(ComponentArg::Dependency { instance, .. }) => Ok(Arc::clone(instance)),
            Some(_) => Err(ArgumentError::NotADependency {
                component: self.component.clone(),
                index,
            }),
            None => Err(ArgumentError::IndexOutOfRange {
                component: self.component.clone(),
                index,
                len: self.args.len(),
            }),
        }
    }

    /// 取出第 `index` 个参数的依赖实例并转换为具体类型
    pub fn dependency<T: Component>(&self, index: usize) -> Result<Arc<T>, ArgumentError> {
        let instance = self.instance(index)?;
        downcast_instance::<T>(&instance).ok_or_else(|| {
            let dependency = match &self.args[index] {
                ComponentArg::Dependency { id, .. } => id.clone(),
                _ => self.component.clone(),
            };
            ArgumentError::TypeMismatch {
                component: self.component.clone(),
                dependency,
                expected: type_name::<T>(),
            }
        })
    }

    /// 按依赖 ID 取出实例并转换为具体类型，适用于显式声明依赖列表的外部组件
    pub fn dependency_by_id<T: Component>(&self, id: &str) -> Result<Arc<T>, ArgumentError> {
        let instance = self
            .args
            .iter()
            .find_map(|arg| match arg {
                ComponentArg::Dependency {
                    id: dependency,
                    instance,
                } if dependency.as_str() == id => Some(instance),
                _ => None,
            })
            .ok_or_else(|| ArgumentError::MissingDependency {
                component: self.component.clone(),
                dependency: ComponentId::new(id),
            })?;

        downcast_instance::<T>(instance).ok_or_else(|| ArgumentError::TypeMismatch {
            component: self.component.clone(),
            dependency: ComponentId::new(id),
            expected: type_name::<T>(),
        })
    }

    /// 描述符上的静态配置
    pub fn static_config(&self) -> Option<&ConfigSection> {
        self.static_config.as_ref()
    }

    /// 将静态配置绑定到具体类型，未提供配置时返回 `None`
    pub fn config<C: DeserializeOwned>(&self) -> Result<Option<C>, ArgumentError> {
        self.static_config()
            .map(ConfigSection::bind)
            .transpose()
            .map_err(|source| ArgumentError::Config {
                component: self.component.clone(),
                source,
            })
    }

    /// 将静态配置绑定到具体类型，未提供配置时使用默认值
    pub fn config_or_default<C: DeserializeOwned + Default>(&self) -> Result<C, ArgumentError> {
        Ok(self.config()?.unwrap_or_default())
    }

    pub fn into_vec(self) -> Vec<ComponentArg> {
        self.args
    }
}
