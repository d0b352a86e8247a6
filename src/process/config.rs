//! # Process configuration.
//!
//! [`ProcessConfig`] describes how a child process is launched: command, arguments,
//! working directory, environment and stdio mode. A config is immutable once handed
//! to the host; redefinition replaces it wholesale.
//!
//! Configs deserialize with `serde`, so a `setup` map can come from a file:
//! ```rust
//! use procvisor::{ProcessConfig, Stdio};
//!
//! let cfg: ProcessConfig = serde_json::from_str(
//!     r#"{ "cwd": "./spec", "command": "node", "args": ["timer.js"], "stdio": "pipe", "start": true }"#,
//! ).unwrap();
//!
//! assert_eq!(cfg.command, "node");
//! assert_eq!(cfg.stdio, Stdio::Pipe);
//! assert!(cfg.autostart);
//! ```
//!
//! A whole `setup` map reads into a [`ProcessMap`], which keeps the document's key order
//! (and with it the registration order):
//! ```rust
//! use procvisor::ProcessMap;
//!
//! let map: ProcessMap = serde_json::from_str(
//!     r#"{ "zeta": { "command": "node" }, "alpha": { "command": "node" } }"#,
//! ).unwrap();
//! assert_eq!(map.ids().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// How the child's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stdio {
    /// stdout/stderr are captured and republished as `stdout`/`stderr` events; stdin is closed.
    #[default]
    Pipe,
    /// The child shares the host's terminal; no output events are published.
    Inherit,
    /// All streams go to the null device.
    Ignore,
}

/// Launch description of one managed process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Working directory (`None` = the host's current directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Program to execute (looked up in `PATH` when not a path).
    pub command: String,
    /// Ordered argument list.
    #[serde(default)]
    pub args: Vec<String>,
    /// Stdio wiring.
    #[serde(default)]
    pub stdio: Stdio,
    /// Environment overrides applied on top of the host's environment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Start immediately when registered through `Host::setup`.
    #[serde(default, rename = "start")]
    pub autostart: bool,
}

impl ProcessConfig {
    /// Config for `command` with no arguments, piped stdio and no auto-start.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            cwd: None,
            command: command.into(),
            args: Vec::new(),
            stdio: Stdio::default(),
            env: BTreeMap::new(),
            autostart: false,
        }
    }

    /// Returns a new config with the given arguments (replacing existing ones).
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Returns a new config with an updated working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Returns a new config with an updated stdio mode.
    pub fn with_stdio(mut self, stdio: Stdio) -> Self {
        self.stdio = stdio;
        self
    }

    /// Returns a new config with one more environment override.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Returns a new config with an updated auto-start flag.
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }
}

/// Ordered `id → config` definitions, as passed to `Host::setup`.
///
/// Deserializes from a map in document order; duplicate identifiers are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessMap(Vec<(String, ProcessConfig)>);

impl ProcessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(id, _)| id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&ProcessConfig> {
        self.0.iter().find(|(k, _)| k == id).map(|(_, cfg)| cfg)
    }

    /// Adds or replaces a definition; a replaced entry keeps its position.
    pub fn insert(&mut self, id: impl Into<String>, config: ProcessConfig) {
        let id = id.into();
        match self.0.iter_mut().find(|(k, _)| *k == id) {
            Some((_, slot)) => *slot = config,
            None => self.0.push((id, config)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for ProcessMap {
    type Item = (String, ProcessConfig);
    type IntoIter = std::vec::IntoIter<(String, ProcessConfig)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, ProcessConfig)> for ProcessMap {
    fn from_iter<I: IntoIterator<Item = (K, ProcessConfig)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, cfg) in iter {
            map.insert(id, cfg);
        }
        map
    }
}

impl<'de> Deserialize<'de> for ProcessMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = ProcessMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of process identifiers to process configs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ProcessMap, A::Error> {
                let mut entries: Vec<(String, ProcessConfig)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, cfg)) = access.next_entry::<String, ProcessConfig>()? {
                    if entries.iter().any(|(k, _)| *k == id) {
                        return Err(de::Error::custom(format!("duplicate process '{id}'")));
                    }
                    entries.push((id, cfg));
                }
                Ok(ProcessMap(entries))
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_every_field() {
        let cfg = ProcessConfig::new("node")
            .with_args(["timer.js", "--fast"])
            .with_cwd("./spec")
            .with_stdio(Stdio::Inherit)
            .with_env("RUST_LOG", "debug")
            .with_autostart(true);

        assert_eq!(cfg.command, "node");
        assert_eq!(cfg.args, vec!["timer.js", "--fast"]);
        assert_eq!(cfg.cwd, Some(PathBuf::from("./spec")));
        assert_eq!(cfg.stdio, Stdio::Inherit);
        assert_eq!(cfg.env.get("RUST_LOG").map(String::as_str), Some("debug"));
        assert!(cfg.autostart);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let cfg: ProcessConfig = serde_json::from_str(r#"{ "command": "sleep" }"#).unwrap();
        assert_eq!(cfg, ProcessConfig::new("sleep"));
    }

    #[test]
    fn process_map_keeps_document_order() {
        let raw = r#"{
            "timer3b": { "command": "node", "args": ["timer.js"], "start": true },
            "timer3a": { "command": "node", "args": ["timer.js"], "stdio": "ignore" }
        }"#;
        let map: ProcessMap = serde_json::from_str(raw).unwrap();

        assert_eq!(map.ids().collect::<Vec<_>>(), vec!["timer3b", "timer3a"]);
        assert!(map.get("timer3b").unwrap().autostart);
        assert_eq!(map.get("timer3a").unwrap().stdio, Stdio::Ignore);
    }

    #[test]
    fn process_map_rejects_duplicate_ids() {
        let raw = r#"{ "web": { "command": "a" }, "web": { "command": "b" } }"#;
        let err = serde_json::from_str::<ProcessMap>(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate process 'web'"));
    }

    #[test]
    fn process_map_insert_keeps_position() {
        let mut map: ProcessMap = [("a", ProcessConfig::new("x")), ("b", ProcessConfig::new("y"))]
            .into_iter()
            .collect();
        map.insert("a", ProcessConfig::new("z"));

        assert_eq!(map.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a").unwrap().command, "z");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn unknown_stdio_mode_is_rejected() {
        let res: Result<ProcessConfig, _> =
            serde_json::from_str(r#"{ "command": "x", "stdio": "socket" }"#);
        assert!(res.is_err());
    }
}
