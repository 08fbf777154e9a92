//! Project configuration, loaded from `sapling.toml` by the driver and
//! passed into the compiler. Every field has a default so a missing or
//! partial file still builds.

use serde::{Deserialize, Serialize};

/// Default visibility of namespace sections that declare neither
/// `private` nor `public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pack name; also the command namespace every file reference and
    /// objective name is scoped under.
    pub project_name: String,
    pub description: String,
    /// Target machine version, e.g. `"1.18.2"`. Decides `pack_format`.
    pub mc_version: String,
    pub default_scope: ScopeMode,
    /// Where the generated pack directory is written, relative to the
    /// project root.
    pub output_directory: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            project_name: "untitled".to_owned(),
            description: String::new(),
            mc_version: "1.18.2".to_owned(),
            default_scope: ScopeMode::Public,
            output_directory: "bin".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("project_name = \"demo\"").unwrap();
        assert_eq!(config.project_name, "demo");
        assert_eq!(config.mc_version, "1.18.2");
        assert_eq!(config.default_scope, ScopeMode::Public);
    }

    #[test]
    fn test_scope_mode_parses_lowercase() {
        let config: Config = toml::from_str("default_scope = \"private\"").unwrap();
        assert_eq!(config.default_scope, ScopeMode::Private);
    }
}
