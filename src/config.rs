use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global config lives at `<config_dir>/tigr/config.toml`
const GLOBAL_CONFIG: &str = "tigr/config.toml";

/// Per-repository overrides at `<repo_root>/.tigr.toml`
const REPO_CONFIG: &str = ".tigr.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub commands: CommandConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Spaces per tab stop in pager views
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,
    /// Show line numbers every N lines (0 = off)
    #[serde(default)]
    pub line_number: usize,
    /// Column-aware layout of multi-byte text
    #[serde(default = "default_true")]
    pub utf8: bool,
}

/// Command templates; `%s` is replaced by the view's reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_main_cmd")]
    pub main: String,
    #[serde(default = "default_diff_cmd")]
    pub diff: String,
    #[serde(default = "default_log_cmd")]
    pub log: String,
    #[serde(default = "default_refs_cmd")]
    pub refs: String,
}

fn default_true() -> bool {
    true
}

fn default_tab_size() -> usize {
    8
}

fn default_main_cmd() -> String {
    "git log --topo-order --stat --pretty=raw %s".into()
}

fn default_diff_cmd() -> String {
    "git show --patch-with-stat --find-copies-harder -B -C %s".into()
}

fn default_log_cmd() -> String {
    "git log --cc --stat -n100 %s".into()
}

fn default_refs_cmd() -> String {
    "git ls-remote . 2>/dev/null".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            commands: CommandConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tab_size: default_tab_size(),
            line_number: 0,
            utf8: true,
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            main: default_main_cmd(),
            diff: default_diff_cmd(),
            log: default_log_cmd(),
            refs: default_refs_cmd(),
        }
    }
}

impl Config {
    /// Environment overrides for the command templates.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots: [(&str, &mut String); 4] = [
            ("TIGR_MAIN_CMD", &mut self.commands.main),
            ("TIGR_DIFF_CMD", &mut self.commands.diff),
            ("TIGR_LOG_CMD", &mut self.commands.log),
            ("TIGR_LS_REMOTE", &mut self.commands.refs),
        ];
        for (name, slot) in slots {
            if let Some(value) = var(name).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(target: "config", var = name, "command_template_override");
                *slot = value;
            }
        }
    }

    /// Apply `git config --list` properties.
    pub fn apply_repo_properties(&mut self, props: &[(String, String)]) {
        for (name, value) in props {
            if name == "i18n.commitencoding" && !value.is_empty() {
                self.display.utf8 = value.eq_ignore_ascii_case("UTF-8");
            }
        }
    }
}

/// Load config by merging global defaults with per-repo overrides.
/// Priority: per-repo `.tigr.toml` > global `~/.config/tigr/config.toml` > built-in defaults.
pub fn load_config(repo_root: Option<&str>) -> Config {
    let global_path = dirs::config_dir().map(|d| d.join(GLOBAL_CONFIG));
    let local_path = repo_root.map(|root| Path::new(root).join(REPO_CONFIG));
    load_config_from(global_path.as_deref(), local_path.as_deref())
}

/// Merge the TOML files at the given paths over the built-in defaults.
/// Unreadable or malformed files are ignored.
pub fn load_config_from(global: Option<&Path>, local: Option<&Path>) -> Config {
    let global_table = global.and_then(read_table);
    let local_table = local.and_then(read_table);

    let merged = match (global_table, local_table) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            toml::Value::Table(global)
        }
        (Some(global), None) => toml::Value::Table(global),
        (None, Some(local)) => toml::Value::Table(local),
        (None, None) => return Config::default(),
    };

    merged.try_into().unwrap_or_else(|err| {
        tracing::warn!(target: "config", %err, "config_parse_failed");
        Config::default()
    })
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let content = std::fs::read_to_string(path).ok()?;
    // A config file is a document, not a single value.
    match content.parse::<toml::Table>() {
        Ok(table) => Some(table),
        Err(err) => {
            tracing::warn!(target: "config", path = %path.display(), %err, "config_file_invalid");
            None
        }
    }
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Directory for the log file.
pub fn log_dir() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
        .join("tigr");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
