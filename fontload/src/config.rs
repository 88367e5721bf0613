use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use strum::EnumIter;

#[derive(Deserialize, Serialize, CopyGetters, Getters, Clone, Debug)]
pub struct Config {
    #[getset(get_copy = "pub")]
    log_timestamp: Option<bool>,

    #[getset(get = "pub")]
    #[serde(default)]
    log_directives: Vec<String>,

    /// Whether the fonts installed on the system are searched.
    #[getset(get_copy = "pub")]
    #[serde(default = "default_load_system_fonts")]
    load_system_fonts: bool,

    /// Load fonts by path.
    #[getset(get = "pub")]
    #[serde(default)]
    external_font_paths: Vec<PathBuf>,

    /// Load every font found in these folders.
    #[getset(get = "pub")]
    #[serde(default)]
    font_folders: Vec<PathBuf>,

    /// Fonts loaded at startup, in the same form as the command line arguments.
    #[getset(get = "pub")]
    #[serde(default)]
    preload_fonts: Vec<String>,

    #[getset(get_copy = "pub")]
    #[serde(default)]
    failure_policy: FailurePolicy,
}

impl Config {
    pub fn new(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            Figment::new().merge(Toml::file(path)).extract()?
        } else {
            Figment::new().extract()?
        };
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

fn default_load_system_fonts() -> bool {
    true
}

/// What happens to a load that failed.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, EnumIter, strum::Display,
)]
pub enum FailurePolicy {
    /// The failure stays cached, later loads of the same font get the same error.
    #[default]
    Keep,
    /// The failure is forgotten once it settles, the next load starts over.
    Evict,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.log_timestamp(), None);
        assert!(config.log_directives().is_empty());
        assert!(config.load_system_fonts());
        assert!(config.external_font_paths().is_empty());
        assert!(config.font_folders().is_empty());
        assert!(config.preload_fonts().is_empty());
        assert_eq!(config.failure_policy(), FailurePolicy::Keep);
    }

    #[test]
    fn values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
log_timestamp = true
log_directives = ["fontload=debug"]
load_system_fonts = false
external_font_paths = ["/opt/fonts/CustomFont.ttf"]
font_folders = ["/opt/fonts"]
preload_fonts = ["16px CustomFont", "bold 12px serif"]
failure_policy = "Evict"
"#,
        )
        .unwrap();

        let config = Config::new(&path).unwrap();
        assert_eq!(config.log_timestamp(), Some(true));
        assert_eq!(config.log_directives(), &vec!["fontload=debug".to_string()]);
        assert!(!config.load_system_fonts());
        assert_eq!(
            config.external_font_paths(),
            &vec![PathBuf::from("/opt/fonts/CustomFont.ttf")]
        );
        assert_eq!(config.font_folders(), &vec![PathBuf::from("/opt/fonts")]);
        assert_eq!(config.preload_fonts().len(), 2);
        assert_eq!(config.failure_policy(), FailurePolicy::Evict);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "failure_policy = \"Retry\"\n").unwrap();
        assert!(Config::new(&path).is_err());
    }

    #[test]
    fn toml_output_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "failure_policy = \"Evict\"\npreload_fonts = [\"16px A\"]\n").unwrap();
        let content = Config::new(&path).unwrap().to_toml().unwrap();
        assert!(content.contains("failure_policy = \"Evict\""));

        let copy = dir.path().join("copy.toml");
        fs::write(&copy, content).unwrap();
        let config = Config::new(&copy).unwrap();
        assert_eq!(config.failure_policy(), FailurePolicy::Evict);
        assert_eq!(config.preload_fonts(), &vec!["16px A".to_string()]);
    }

    #[test]
    fn policy_names() {
        let names: Vec<String> = FailurePolicy::iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["Keep", "Evict"]);
    }
}
