use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults read from an optional `kuba.yaml`; command-line flags take precedence.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Settings {
    pub source: Option<String>,
    pub namespace: Option<String>,
    pub context: Option<String>,
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct KubaConfigFile {
    #[serde(default, alias = "ns")]
    namespace: Option<String>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default, alias = "log")]
    log_filter: Option<String>,
}

const CONFIG_ENV: &str = "KUBA_CONFIG";
const DEFAULT_LOG_FILTER: &str = "warn";
const LOCAL_FILES: [&str; 3] = ["kuba.yaml", "kuba.yml", ".kuba.yaml"];
const HOME_FILES: [&str; 3] = [
    ".config/kuba/config.yaml",
    ".config/kuba/config.yml",
    ".kuba.yaml",
];

impl Settings {
    /// Loads `$KUBA_CONFIG` when set, else the first config file found in the
    /// working directory or under `$HOME`.
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV)
            && !path.trim().is_empty()
        {
            return Self::load(Path::new(path.trim()));
        }

        let home = std::env::var_os("HOME").map(PathBuf::from);
        match Self::search(Path::new("."), home.as_deref()) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn search(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
        let local = LOCAL_FILES.iter().map(|name| cwd.join(name));
        let user = home
            .into_iter()
            .flat_map(|home| HOME_FILES.iter().map(move |name| home.join(name)));
        local.chain(user).find(|candidate| candidate.is_file())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let parsed: KubaConfigFile = if raw.trim().is_empty() {
            KubaConfigFile::default()
        } else {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        };

        Ok(Self {
            source: Some(path.display().to_string()),
            namespace: non_empty(parsed.namespace),
            context: non_empty(parsed.context),
            log_filter: non_empty(parsed.log_filter),
        })
    }

    /// First non-empty namespace among `flag`, the config file, and `fallback`.
    pub fn resolve_namespace(&self, flag: Option<&str>, fallback: &str) -> String {
        flag.map(str::trim)
            .filter(|value| !value.is_empty())
            .or(self.namespace.as_deref())
            .unwrap_or(fallback)
            .to_string()
    }

    pub fn resolve_context<'a>(&'a self, flag: Option<&'a str>) -> Option<&'a str> {
        flag.or(self.context.as_deref())
    }

    pub fn resolve_log_filter<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.or(self.log_filter.as_deref())
            .unwrap_or(DEFAULT_LOG_FILTER)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
