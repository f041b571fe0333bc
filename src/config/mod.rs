//! Configuration loader (§6, Design Notes §9).
//!
//! Reads the key/value mapping of §6 from a fixed default path. A missing
//! file is `Ok(None)`, not an error, matching §7's "configuration missing:
//! silent skip".

use std::collections::HashMap;
use std::path::Path;

/// The fixed default configuration path the CLI reads from.
pub const DEFAULT_CONFIG_PATH: &str = "./jcl.cfg";

/// Typed view over the recognized configuration keys (§6), with
/// unrecognized keys preserved in `extra` for forward compatibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub system: Option<String>,
    pub path: Option<String>,
    pub lib: Vec<String>,
    pub ext: Option<String>,
    pub file: Option<String>,
    pub project: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub drop_tables: bool,
    pub extra: HashMap<String, String>,
}

impl Config {
    /// `true` when `SYSTEM=Z` selects native-PDS resolution; any other
    /// value (or its absence) selects filesystem mode.
    pub fn is_native_pds(&self) -> bool {
        self.system.as_deref() == Some("Z")
    }

    /// The ordered library search list: `PATH` first, then `LIB` entries.
    pub fn library_roots(&self) -> Vec<String> {
        let mut roots = Vec::new();
        if let Some(path) = &self.path {
            roots.push(path.clone());
        }
        roots.extend(self.lib.iter().cloned());
        roots
    }

    /// Load from the fixed default path. Returns `Ok(None)` if the file
    /// does not exist.
    pub fn load_default() -> std::io::Result<Option<Config>> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Option<Config>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(Self::parse(&text)))
    }

    fn parse(text: &str) -> Config {
        let mut cfg = Config::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim().to_string();
            match key.as_str() {
                "SYSTEM" => cfg.system = Some(value),
                "PATH" => cfg.path = Some(value),
                "LIB" => cfg.lib.push(value),
                "EXT" => cfg.ext = Some(value),
                "FILE" => cfg.file = Some(value),
                "PROJECT" => cfg.project = Some(value),
                "DATABASE" => cfg.database = Some(value),
                "USER" => cfg.user = Some(value),
                "PASSWORD" => cfg.password = Some(value),
                "DROP_TABLES" => cfg.drop_tables = value.eq_ignore_ascii_case("true") || value == "1",
                _ => {
                    cfg.extra.insert(key, value);
                }
            }
        }
        cfg
    }
}
