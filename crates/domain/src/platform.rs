//! Platform capabilities for the config-directory commands.
//!
//! The picker on macOS can return files and folders in one selection, so only
//! the mixed command exists there. Elsewhere files and folders are picked by
//! separate commands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Command id for the `.DS_Store` cleanup.
pub const DS_STORE_COMMAND_ID: &str = "delete-DSStore-in-vault";

/// Host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    /// Apple macOS.
    MacOs,
    /// Microsoft Windows.
    Windows,
    /// Linux and other Unix-likes.
    Linux,
    /// Anything else.
    Other,
}

impl OsKind {
    /// Map a `std::env::consts::OS` value.
    #[must_use]
    pub fn from_os_name(name: &str) -> Self {
        match name {
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Self::Linux,
            _ => Self::Other,
        }
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// What a config-directory selection may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    /// Files only.
    Files,
    /// Directories only.
    Folders,
    /// Files and directories.
    Mixed,
}

impl SelectionKind {
    /// Returns true if an item of the given kind may be selected.
    #[must_use]
    pub const fn accepts(self, is_directory: bool) -> bool {
        match self {
            Self::Files => !is_directory,
            Self::Folders => is_directory,
            Self::Mixed => true,
        }
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Folders => "folders",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A config-directory command available on the current platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDirCommand {
    /// Stable command id.
    pub id: &'static str,
    /// Human-readable command name.
    pub name: &'static str,
    /// Selection the command accepts.
    pub kind: SelectionKind,
}

const FILES_COMMAND: ConfigDirCommand = ConfigDirCommand {
    id: "delete-files-in-obsidian-config",
    name: "Delete files in .obsidian folder",
    kind: SelectionKind::Files,
};

const FOLDERS_COMMAND: ConfigDirCommand = ConfigDirCommand {
    id: "delete-folders-in-obsidian-config",
    name: "Delete folders in .obsidian folder",
    kind: SelectionKind::Folders,
};

const MIXED_COMMAND: ConfigDirCommand = ConfigDirCommand {
    id: "delete-in-obsidian-config",
    name: "Delete folders or files in .obsidian folder",
    kind: SelectionKind::Mixed,
};

/// Platform facts resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    os: OsKind,
}

impl PlatformCapabilities {
    /// Capabilities for an explicit OS family.
    #[must_use]
    pub const fn new(os: OsKind) -> Self {
        Self { os }
    }

    /// Capabilities for the host this binary was built for.
    #[must_use]
    pub fn detect() -> Self {
        Self::new(OsKind::from_os_name(std::env::consts::OS))
    }

    /// OS family.
    #[must_use]
    pub const fn os(&self) -> OsKind {
        self.os
    }

    /// Config-directory commands offered on this platform.
    #[must_use]
    pub fn config_dir_commands(&self) -> Vec<ConfigDirCommand> {
        match self.os {
            OsKind::MacOs => vec![MIXED_COMMAND],
            _ => vec![FILES_COMMAND, FOLDERS_COMMAND],
        }
    }

    /// Command for a selection kind, if offered on this platform.
    #[must_use]
    pub fn command_for(&self, kind: SelectionKind) -> Option<ConfigDirCommand> {
        self.config_dir_commands()
            .into_iter()
            .find(|command| command.kind == kind)
    }

    /// Returns true if the selection kind is offered on this platform.
    #[must_use]
    pub fn supports(&self, kind: SelectionKind) -> bool {
        self.command_for(kind).is_some()
    }

    /// Default picker directory: `<vault>/<config dir>` with native separators.
    #[must_use]
    pub fn default_config_dir(&self, vault_root: &Path, config_dir: &str) -> PathBuf {
        let mut path = vault_root.to_path_buf();
        for segment in config_dir.split(['/', '\\']).filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }
}
