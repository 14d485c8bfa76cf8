use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const KNOWN_KEYS: &[&str] = &["SSH", "FORMAT", "DISCOVER_DAYS"];

const DEFAULT_SSH: &str = "ssh";
const DEFAULT_DISCOVER_DAYS: u64 = 30;

pub struct Settings {
    pub ssh: String,
    pub format: Option<String>,
    pub discover_days: u64,
}

impl Settings {
    /// Environment first, then `~/.mhist/config`, then built-in defaults.
    pub fn load(home: &Path) -> Self {
        let file = load_config(&config_path(home));
        Self::resolve(&file, |key| std::env::var(format!("MHIST_{key}")).ok())
    }

    fn resolve(file: &HashMap<String, String>, env: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| env(key).or_else(|| file.get(key).cloned());
        Self {
            ssh: get("SSH")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SSH.to_string()),
            format: get("FORMAT").filter(|s| !s.is_empty()),
            discover_days: get("DISCOVER_DAYS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_DISCOVER_DAYS),
        }
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    match std::env::var("MHIST_CONFIG") {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => home.join(".mhist").join("config"),
    }
}

pub fn load_config(path: &Path) -> HashMap<String, String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    parse_config(&content)
}

fn parse_config(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter(|l| !l.trim_start().starts_with('#') && !l.trim().is_empty())
        .filter_map(|l| {
            let (k, v) = l.split_once('=')?;
            Some((k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}
