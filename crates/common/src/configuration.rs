//! 组件静态配置

use crate::errors::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 配置节
///
/// 注册时附加到组件描述符上的不透明配置值，由组件工厂按需绑定到具体类型。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSection {
    value: Value,
}

impl ConfigSection {
    /// 创建新的配置节
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// 按点分路径获取配置项，例如 `"source.preferred"`
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.value, |current, key| current.as_object()?.get(key))
    }

    /// 绑定到具体类型
    pub fn bind<T>(&self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.value.clone())
            .map_err(|e| ConfigError::BindError { source: e })
    }

    /// 绑定某个子路径到具体类型
    pub fn bind_path<T>(&self, path: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let value = self.get(path).ok_or_else(|| ConfigError::KeyNotFound {
            key: path.to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| ConfigError::BindError { source: e })
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl From<Value> for ConfigSection {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct UpdateSettings {
        auto_download: bool,
        channel: String,
    }

    #[test]
    fn binds_whole_section() {
        let section = ConfigSection::from(json!({ "auto_download": true, "channel": "stable" }));
        let settings: UpdateSettings = section.bind().unwrap();
        assert_eq!(
            settings,
            UpdateSettings {
                auto_download: true,
                channel: "stable".to_string(),
            }
        );
    }

    #[test]
    fn resolves_dotted_paths() {
        let section = ConfigSection::from(json!({ "source": { "preferred": "gitee" } }));
        assert_eq!(section.get("source.preferred"), Some(&json!("gitee")));
        assert!(section.get("source.missing").is_none());

        let preferred: String = section.bind_path("source.preferred").unwrap();
        assert_eq!(preferred, "gitee");
        assert!(matches!(
            section.bind_path::<String>("nope"),
            Err(ConfigError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn bind_type_mismatch_is_reported() {
        let section = ConfigSection::from(json!({ "auto_download": "yes", "channel": 1 }));
        assert!(matches!(
            section.bind::<UpdateSettings>(),
            Err(ConfigError::BindError { .. })
        ));
    }
}
