//! Deployment environment a migration run targets

use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Docker,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Docker => "docker",
        }
    }

    /// Inspect the process environment
    pub fn detect() -> Self {
        Self::detect_from(
            Path::new("/.dockerenv").exists(),
            std::env::var("FLASK_ENV").ok().as_deref(),
            std::env::var("NODE_ENV").ok().as_deref(),
        )
    }

    pub fn detect_from(dockerenv: bool, flask_env: Option<&str>, node_env: Option<&str>) -> Self {
        if dockerenv {
            Environment::Docker
        } else if flask_env == Some("production") || node_env == Some("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a migration may run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentScope {
    All,
    Only(Vec<Environment>),
}

impl EnvironmentScope {
    pub fn allows(&self, env: Environment) -> bool {
        match self {
            EnvironmentScope::All => true,
            EnvironmentScope::Only(envs) => envs.contains(&env),
        }
    }

    pub fn describe(&self) -> Vec<String> {
        match self {
            EnvironmentScope::All => vec!["all".to_string()],
            EnvironmentScope::Only(envs) => envs.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from() {
        assert_eq!(
            Environment::detect_from(true, Some("production"), None),
            Environment::Docker
        );
        assert_eq!(
            Environment::detect_from(false, None, Some("production")),
            Environment::Production
        );
        assert_eq!(
            Environment::detect_from(false, Some("development"), None),
            Environment::Development
        );
    }

    #[test]
    fn test_scope() {
        assert!(EnvironmentScope::All.allows(Environment::Docker));
        let only = EnvironmentScope::Only(vec![Environment::Production]);
        assert!(only.allows(Environment::Production));
        assert!(!only.allows(Environment::Development));
        assert_eq!(only.describe(), vec!["production".to_string()]);
    }
}
