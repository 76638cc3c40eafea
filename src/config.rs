//! Application configuration: parse `usradmin.conf` and merge CLI overrides.
//!
//! The file uses the same `key = value` format as the theme and keybinding
//! files. Unknown keys are ignored; malformed values keep the default.

use tracing::warn;

use crate::controller::{DEFAULT_PAGE_LIMIT, ErrorPolicy, RefreshStrategy, SyncPolicy, WriteKind};
use crate::error::{Context, Result};

pub const CONFIG_FILE: &str = "usradmin.conf";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub endpoint: String,
    pub page_limit: usize,
    pub log_level: String,
    pub log_file: String,
    pub policy: SyncPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4000/graphql".to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            log_level: "info".to_string(),
            log_file: "usradmin.log".to_string(),
            policy: SyncPolicy::DEFAULT,
        }
    }
}

fn parse_error_policy(s: &str) -> Option<ErrorPolicy> {
    match s.to_ascii_lowercase().as_str() {
        "record" | "surface" => Some(ErrorPolicy::Record),
        "ignore" => Some(ErrorPolicy::Ignore),
        _ => None,
    }
}

fn parse_refresh(s: &str) -> Option<RefreshStrategy> {
    match s.to_ascii_lowercase().as_str() {
        "refetch" => Some(RefreshStrategy::Refetch),
        "patch" | "patch_by_id" => Some(RefreshStrategy::PatchById),
        _ => None,
    }
}

fn policy_slot(policy: &mut SyncPolicy, kind: WriteKind) -> &mut crate::controller::WritePolicy {
    match kind {
        WriteKind::Create => &mut policy.create,
        WriteKind::Edit => &mut policy.edit,
        WriteKind::Delete => &mut policy.delete,
    }
}

impl AppConfig {
    /// Parse configuration text on top of the defaults.
    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if key.is_empty() || val.is_empty() {
                continue;
            }
            if !cfg.apply(key, val) {
                warn!(key, value = val, "ignoring config entry");
            }
        }
        cfg
    }

    fn apply(&mut self, key: &str, val: &str) -> bool {
        let kind_of = |prefix: &str| match prefix {
            "create" => Some(WriteKind::Create),
            "edit" => Some(WriteKind::Edit),
            "delete" => Some(WriteKind::Delete),
            _ => None,
        };
        match key {
            "endpoint" => self.endpoint = val.to_string(),
            "page_limit" => match val.parse::<usize>() {
                Ok(n) if n > 0 => self.page_limit = n,
                _ => return false,
            },
            "log_level" => self.log_level = val.to_string(),
            "log_file" => self.log_file = val.to_string(),
            _ => {
                if let Some((prefix, setting)) = key.split_once('_') {
                    let Some(kind) = kind_of(prefix) else { return false };
                    let slot = policy_slot(&mut self.policy, kind);
                    match setting {
                        "errors" => match parse_error_policy(val) {
                            Some(p) => slot.errors = p,
                            None => return false,
                        },
                        "refresh" => match parse_refresh(val) {
                            Some(r) => slot.refresh = r,
                            None => return false,
                        },
                        _ => return false,
                    }
                } else {
                    return false;
                }
            }
        }
        true
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &str) -> Result<Self> {
        if !std::path::Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).with_ctx(|| format!("read {path}"))?;
        Ok(Self::parse(&contents))
    }

    /// Apply a `kind=policy` override from the command line, e.g. `edit=record`.
    pub fn override_errors(&mut self, spec: &str) -> bool {
        match spec.split_once('=') {
            Some((kind, val)) => self.apply(&format!("{}_errors", kind.trim()), val.trim()),
            None => false,
        }
    }
}
