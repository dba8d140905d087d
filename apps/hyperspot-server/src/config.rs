//! Loads the host's YAML configuration file and exposes each module's
//! `modules.<name>` section through [`modkit::config::ConfigProvider`].

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use figment::providers::{Format, Yaml};
use figment::Figment;
use modkit::config::ConfigProvider;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8087".to_owned() }
    }
}

/// The `server` section plus whatever `modules.<name>` sections the config
/// file declares. Unknown top-level sections are ignored rather than
/// rejected, since other `modkit` hosts may carry sections this binary
/// doesn't know about.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerSection,
    modules: BTreeMap<String, Value>,
}

impl AppConfig {
    /// Loads configuration from a YAML file, or returns defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            anyhow::bail!("config file '{}' does not exist", path.display());
        }

        let raw: Value = Figment::new()
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("invalid YAML in config file '{}'", path.display()))?;

        let server = match raw.get("server") {
            Some(section) => serde_json::from_value(section.clone())
                .with_context(|| format!("invalid 'server' section in '{}'", path.display()))?,
            None => ServerSection::default(),
        };

        let modules = raw
            .get("modules")
            .and_then(Value::as_object)
            .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Ok(Self { server, modules })
    }

    /// Names of every module declared under `modules:` in the config file.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }
}

impl ConfigProvider for AppConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&Value> {
        self.modules.get(module_name)
    }
}
