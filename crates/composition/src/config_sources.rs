//! 组件静态配置源
//!
//! 按添加顺序叠加 TOML、JSON 文件与环境变量，后添加的源覆盖先添加的源。
//! 合并结果的顶层键即组件 ID，每个键对应的表成为该组件的静态配置。

use companion_common::{ConfigError, ConfigResult, ConfigSection};
use config::{Config, Environment, File, FileFormat};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 配置源类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSourceType {
    /// TOML 文件
    Toml(PathBuf),
    /// JSON 文件
    Json(PathBuf),
    /// 环境变量，`PREFIX__COMPONENT__KEY` 映射为 `component.key`
    Environment { prefix: String, separator: String },
}

/// 组件配置加载器
#[derive(Debug, Clone, Default)]
pub struct ComponentConfigLoader {
    sources: Vec<ConfigSourceType>,
}

impl ComponentConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加 TOML 配置文件
    pub fn add_toml_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = existing_file(path.as_ref())?;
        debug!("添加 TOML 配置源: {}", path.display());
        self.sources.push(ConfigSourceType::Toml(path));
        Ok(())
    }

    /// 添加 JSON 配置文件
    pub fn add_json_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = existing_file(path.as_ref())?;
        debug!("添加 JSON 配置源: {}", path.display());
        self.sources.push(ConfigSourceType::Json(path));
        Ok(())
    }

    /// 添加环境变量配置源，层级分隔符为 `__`
    pub fn add_environment(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        debug!("添加环境变量配置源，前缀: {}", prefix);
        self.sources.push(ConfigSourceType::Environment {
            prefix,
            separator: "__".to_string(),
        });
    }

    pub fn sources(&self) -> &[ConfigSourceType] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// 合并所有配置源并按组件 ID 拆分
    pub fn load(&self) -> ConfigResult<ComponentConfigs> {
        if self.sources.is_empty() {
            return Ok(ComponentConfigs::default());
        }

        let mut builder = Config::builder();
        for source in &self.sources {
            builder = match source {
                ConfigSourceType::Toml(path) => {
                    builder.add_source(File::from(path.as_path()).format(FileFormat::Toml))
                }
                ConfigSourceType::Json(path) => {
                    builder.add_source(File::from(path.as_path()).format(FileFormat::Json))
                }
                ConfigSourceType::Environment { prefix, separator } => builder.add_source(
                    Environment::with_prefix(prefix)
                        .prefix_separator(separator)
                        .separator(separator)
                        .try_parsing(true),
                ),
            };
        }

        let merged = builder.build().map_err(|e| ConfigError::LoadError {
            source: Box::new(e),
        })?;

        let tables: HashMap<String, Value> =
            merged
                .try_deserialize()
                .map_err(|e| ConfigError::InvalidFormat {
                    message: format!("顶层配置必须以组件 ID 为键: {}", e),
                })?;

        let mut sections = HashMap::with_capacity(tables.len());
        for (id, value) in tables {
            if !value.is_object() {
                return Err(ConfigError::InvalidFormat {
                    message: format!("组件 {} 的配置必须是表", id),
                });
            }
            sections.insert(id, ConfigSection::new(value));
        }

        info!("组件配置加载完成，共 {} 个组件", sections.len());
        Ok(ComponentConfigs { sections })
    }
}

fn existing_file(path: &Path) -> ConfigResult<PathBuf> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(path.to_path_buf())
}

/// 按组件 ID 拆分后的静态配置
#[derive(Debug, Clone, Default)]
pub struct ComponentConfigs {
    sections: HashMap<String, ConfigSection>,
}

impl ComponentConfigs {
    /// 查找组件配置
    ///
    /// 环境变量无法表达 `-`，因此精确匹配失败时再以 `_` 替换 `-` 查找一次。
    pub fn section(&self, id: &str) -> Option<&ConfigSection> {
        self.sections.get(id).or_else(|| {
            id.contains('-')
                .then(|| id.replace('-', "_"))
                .and_then(|alias| self.sections.get(&alias))
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
