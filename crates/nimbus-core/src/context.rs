use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

///
/// AppNamespace
///
/// Scope shared by keys and queries: the owning application id plus the
/// namespace inside it. The empty namespace is the default namespace.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct AppNamespace {
    pub app_id: String,
    #[serde(default)]
    pub namespace: String,
}

impl AppNamespace {
    #[must_use]
    pub fn new(app_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            namespace: namespace.into(),
        }
    }

    /// Scope in the default namespace.
    #[must_use]
    pub fn app(app_id: impl Into<String>) -> Self {
        Self::new(app_id, "")
    }

    #[must_use]
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self::new(self.app_id.clone(), namespace)
    }
}

impl fmt::Display for AppNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.app_id)
        } else {
            write!(f, "{}!{}", self.app_id, self.namespace)
        }
    }
}

///
/// ContextError
///
/// Resolution failures against the execution environment. These are
/// configuration problems, not translation failures, and are never retried.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ContextError {
    #[error("no app id is registered for foreign project '{project_id}'")]
    UnknownProject { project_id: String },

    #[error("no project id is registered for foreign app '{app_id}'")]
    UnknownApp { app_id: String },
}

///
/// AppContext
///
/// Execution environment the translators consult when a key crosses
/// protocols. The public protocol names partitions by project id while keys
/// carry app ids; the current app maps to `project_id` and any other app must
/// be listed in `foreign_projects` (project id -> app id).
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AppContext {
    pub app_id: String,
    pub project_id: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub foreign_projects: BTreeMap<String, String>,
}

impl AppContext {
    #[must_use]
    pub fn new(app_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            project_id: project_id.into(),
            namespace: String::new(),
            foreign_projects: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Register a foreign project and the app id it resolves to.
    #[must_use]
    pub fn foreign_project(
        mut self,
        project_id: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        self.foreign_projects
            .insert(project_id.into(), app_id.into());
        self
    }

    /// Default scope for keys and queries built in this context.
    #[must_use]
    pub fn scope(&self) -> AppNamespace {
        AppNamespace::new(self.app_id.clone(), self.namespace.clone())
    }

    pub fn app_id_for_project(&self, project_id: &str) -> Result<String, ContextError> {
        if project_id == self.project_id {
            return Ok(self.app_id.clone());
        }

        self.foreign_projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| ContextError::UnknownProject {
                project_id: project_id.to_string(),
            })
    }

    pub fn project_id_for_app(&self, app_id: &str) -> Result<String, ContextError> {
        if app_id == self.app_id {
            return Ok(self.project_id.clone());
        }

        self.foreign_projects
            .iter()
            .find(|(_, app)| app.as_str() == app_id)
            .map(|(project, _)| project.clone())
            .ok_or_else(|| ContextError::UnknownApp {
                app_id: app_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_app_resolves_without_table() {
        let ctx = AppContext::new("s~shop", "shop");

        assert_eq!(ctx.project_id_for_app("s~shop").unwrap(), "shop");
        assert_eq!(ctx.app_id_for_project("shop").unwrap(), "s~shop");
    }

    #[test]
    fn foreign_project_uses_table() {
        let ctx = AppContext::new("s~shop", "shop").foreign_project("billing", "e~billing");

        assert_eq!(ctx.app_id_for_project("billing").unwrap(), "e~billing");
        assert_eq!(ctx.project_id_for_app("e~billing").unwrap(), "billing");
    }

    #[test]
    fn unknown_foreign_project_is_configuration_error() {
        let ctx = AppContext::new("s~shop", "shop");

        assert_eq!(
            ctx.app_id_for_project("other"),
            Err(ContextError::UnknownProject {
                project_id: "other".to_string()
            })
        );
        assert!(matches!(
            ctx.project_id_for_app("s~other"),
            Err(ContextError::UnknownApp { .. })
        ));
    }

    #[test]
    fn scope_display_includes_namespace() {
        assert_eq!(AppNamespace::app("a").to_string(), "a");
        assert_eq!(AppNamespace::new("a", "ns").to_string(), "a!ns");
    }
}
