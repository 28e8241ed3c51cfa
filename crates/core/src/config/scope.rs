//! Directory scopes for the conversion allowlist

use serde::{Deserialize, Serialize};

/// Default conversion decision for a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryDefault {
    /// Only this directory converts
    Enabled,
    /// Only this directory is skipped
    Disabled,
    /// This directory and everything below it converts
    EnabledRecursive,
    /// This directory and everything below it is skipped
    DisabledRecursive,
}

impl DirectoryDefault {
    pub fn is_enabled(self) -> bool {
        matches!(self, DirectoryDefault::Enabled | DirectoryDefault::EnabledRecursive)
    }

    pub fn is_recursive(self) -> bool {
        matches!(
            self,
            DirectoryDefault::EnabledRecursive | DirectoryDefault::DisabledRecursive
        )
    }
}

/// One `directories` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryScope {
    dir: String,
    default: DirectoryDefault,
}

impl DirectoryScope {
    pub fn new(dir: impl Into<String>, default: DirectoryDefault) -> Self {
        Self {
            dir: dir.into(),
            default,
        }
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn default(&self) -> DirectoryDefault {
        self.default
    }

    /// Check if this scope covers `dir`
    pub fn matches(&self, dir: &str) -> bool {
        if self.dir == dir {
            return true;
        }
        if !self.default.is_recursive() {
            return false;
        }
        self.dir.is_empty() || dir.strip_prefix(&self.dir).is_some_and(|rest| rest.starts_with('/'))
    }

    /// Higher is more specific; an exact entry beats any recursive ancestor
    pub fn specificity(&self, dir: &str) -> usize {
        let depth = if self.dir.is_empty() {
            0
        } else {
            self.dir.split('/').count()
        };
        if self.dir == dir { depth * 2 + 1 } else { depth * 2 }
    }
}
