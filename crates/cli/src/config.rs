use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Configuration loaded from an optional TOML file.
///
/// ```toml
/// [rules]
/// files = ["rules/style.yaml"]
/// debug = ["const-add"]
///
/// [run]
/// jobs = 4
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Which rules to load.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Rule files; relative paths are resolved against the config file.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Rules whose filter rejections are traced.
    #[serde(default)]
    pub debug: Vec<String>,
}

/// How files are checked.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Maximum number of files checked at once.
    pub jobs: Option<usize>,
}

impl Config {
    /// Load `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        let base = path.parent().unwrap_or(Path::new("."));
        for file in &mut config.rules.files {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
        Ok(config)
    }

    /// Rule files from the command line take precedence over the config file.
    pub fn rule_files(&self, flags: &[PathBuf]) -> Vec<PathBuf> {
        if flags.is_empty() {
            self.rules.files.clone()
        } else {
            flags.to_vec()
        }
    }

    /// Rules to trace: the config file's list plus the command line's.
    pub fn debug_rules<'a>(&'a self, flags: &'a [String]) -> Vec<&'a str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.rules.debug.iter().chain(flags) {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// Number of parallel jobs: the flag, then the config file, then the
    /// available parallelism.
    pub fn jobs(&self, flag: Option<usize>) -> usize {
        flag.or(self.run.jobs)
            .or_else(|| std::thread::available_parallelism().ok().map(usize::from))
            .unwrap_or(1)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let config: Config = toml::from_str(
            r#"
[rules]
files = ["a.yaml", "/abs/b.yml"]
debug = ["x"]

[run]
jobs = 3
"#,
        )
        .unwrap();
        assert_eq!(config.rules.files.len(), 2);
        assert_eq!(config.rules.debug, vec!["x"]);
        assert_eq!(config.jobs(None), 3);
        assert_eq!(config.jobs(Some(8)), 8);
        assert_eq!(config.jobs(Some(0)), 1);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.rules.files.is_empty());
        assert!(config.jobs(None) >= 1);
        assert!(Config::load(None).unwrap().rules.debug.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[rules]\nfile = []\n").is_err());
    }

    #[test]
    fn flags_override_and_extend() {
        let config: Config =
            toml::from_str("[rules]\nfiles = [\"a.yaml\"]\ndebug = [\"x\", \"y\"]\n").unwrap();
        assert_eq!(config.rule_files(&[]), vec![PathBuf::from("a.yaml")]);
        assert_eq!(
            config.rule_files(&[PathBuf::from("b.yaml")]),
            vec![PathBuf::from("b.yaml")]
        );
        let flags = vec!["y".to_owned(), "z".to_owned()];
        assert_eq!(config.debug_rules(&flags), vec!["x", "y", "z"]);
    }

    #[test]
    fn relative_rule_files_follow_the_config() {
        let dir = std::env::temp_dir().join(format!("astguard-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("astguard.toml");
        std::fs::write(&path, "[rules]\nfiles = [\"rules.yaml\"]\n").unwrap();
        let config = Config::load(Some(&path));
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(config.unwrap().rules.files, vec![dir.join("rules.yaml")]);
    }
}
