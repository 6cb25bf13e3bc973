use nimbus_core::{
    AppContext,
    translate::{Protocol, TranslateOptions},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid datastore config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// AppConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AppConfig {
    pub app_id: String,
    pub project_id: String,
    #[serde(default)]
    pub namespace: String,
}

///
/// DatastoreConfig
///
/// ```toml
/// protocol = "public"
/// empty_list_support = true
///
/// [app]
/// app_id = "s~shop"
/// project_id = "shop"
///
/// [foreign_projects]
/// billing = "e~billing"
/// ```
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DatastoreConfig {
    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default)]
    pub empty_list_support: bool,

    pub app: AppConfig,

    /// Foreign project id -> app id.
    #[serde(default)]
    pub foreign_projects: BTreeMap<String, String>,
}

impl DatastoreConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    #[must_use]
    pub fn context(&self) -> AppContext {
        let mut context = AppContext::new(&self.app.app_id, &self.app.project_id)
            .namespace(&self.app.namespace);
        context.foreign_projects.clone_from(&self.foreign_projects);

        context
    }

    #[must_use]
    pub const fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            empty_list_support: self.empty_list_support,
        }
    }
}

///
/// TESTS
///
