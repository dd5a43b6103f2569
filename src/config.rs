// Copyright 2026 Bizsearch Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::present::DEFAULT_NARRATIVE_MAX_LEN;
use crate::present::DEFAULT_WINDOW_SIZE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub page_limit: u32,
    pub narrative_max_len: usize,
    pub debounce_ms: u64,
    pub window_size: u32,
    pub search_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_limit: 12,
            narrative_max_len: DEFAULT_NARRATIVE_MAX_LEN,
            debounce_ms: 500,
            window_size: DEFAULT_WINDOW_SIZE,
            search_path: "/search".to_string(),
        }
    }
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn sanitize(mut self) -> Self {
        let defaults = Config::default();
        if self.page_limit == 0 {
            self.page_limit = defaults.page_limit;
        }
        if self.narrative_max_len == 0 {
            self.narrative_max_len = defaults.narrative_max_len;
        }
        if self.window_size == 0 {
            self.window_size = defaults.window_size;
        }
        if self.search_path.trim().is_empty() {
            self.search_path = defaults.search_path;
        }
        self
    }
}

fn config_dir() -> Option<PathBuf> {
    config_dir_from(|key| std::env::var(key).ok())
}

fn config_dir_from(var: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        if let Some(appdata) = var("APPDATA") {
            return Some(PathBuf::from(appdata));
        }
        return var("USERPROFILE")
            .map(|profile| PathBuf::from(profile).join("AppData").join("Roaming"));
    }

    if cfg!(target_os = "macos") {
        let home = var("HOME")?;
        return Some(
            PathBuf::from(home)
                .join("Library")
                .join("Application Support"),
        );
    }

    if let Some(xdg) = var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg));
    }
    var("HOME").map(|home| PathBuf::from(home).join(".config"))
}

pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("bizsearch").join("bizsearch.toml"))
}

pub fn load_global_config() -> Result<Config> {
    load_config_at(global_config_path().as_deref())
}

/// Defaults when there is no config location or no file at it.
fn load_config_at(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if path.exists() => read_config(path),
        _ => Ok(Config::default()),
    }
}

pub fn read_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config: Config = toml::from_str(&text).context("parse bizsearch.toml")?;
    Ok(config.sanitize())
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    if path.exists() {
        anyhow::bail!("config already exists at {}", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(config).context("serialize config")?;
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn config_dir_follows_platform_variables() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("HOME", "/home/ana"), ("APPDATA", "C:/Roaming")]);
        let dir = config_dir_from(|key| vars.get(key).map(|v| v.to_string()));
        let expected = if cfg!(target_os = "windows") {
            PathBuf::from("C:/Roaming")
        } else if cfg!(target_os = "macos") {
            PathBuf::from("/home/ana/Library/Application Support")
        } else {
            PathBuf::from("/home/ana/.config")
        };
        assert_eq!(dir, Some(expected));
        assert_eq!(config_dir_from(|_| None), None);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("dir");
        let path = dir.path().join("bizsearch.toml");
        assert_eq!(load_config_at(Some(&path)).expect("load"), Config::default());
        assert_eq!(load_config_at(None).expect("load"), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("dir");
        let path = dir.path().join("bizsearch.toml");
        std::fs::write(&path, "page_limit = 24\nnarrative_max_len = 200\n").expect("write");
        let config = load_config_at(Some(&path)).expect("load");
        assert_eq!(config.page_limit, 24);
        assert_eq!(config.narrative_max_len, 200);
        assert_eq!(config.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let dir = tempdir().expect("dir");
        let path = dir.path().join("bizsearch.toml");
        std::fs::write(&path, "window_size = 0\npage_limit = 0\nsearch_path = \"\"\n")
            .expect("write");
        let config = read_config(&path).expect("read");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn write_refuses_to_overwrite() {
        let dir = tempdir().expect("dir");
        let path = dir.path().join("nested").join("bizsearch.toml");
        write_config(&path, &Config::default()).expect("first write");
        assert_eq!(read_config(&path).expect("read"), Config::default());
        let err = write_config(&path, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
