use std::path::PathBuf;

use reflow_core::configuration::ConfigurationDiagnostic;
use thiserror::Error;

/// A fatal problem with the provided configuration. Nothing is formatted
/// when one of these occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
  #[error("Invalid global configuration: {}", display_diagnostics(.diagnostics))]
  Global { diagnostics: Vec<ConfigurationDiagnostic> },
  #[error("Found configuration for unknown plugin: {config_key}")]
  UnknownPlugin { config_key: String },
  #[error("Invalid configuration for plugin '{plugin}': {}", display_diagnostics(.diagnostics))]
  PluginDiagnostics {
    plugin: String,
    diagnostics: Vec<ConfigurationDiagnostic>,
  },
}

fn display_diagnostics(diagnostics: &[ConfigurationDiagnostic]) -> String {
  diagnostics.iter().map(|diagnostic| diagnostic.to_string()).collect::<Vec<_>>().join("; ")
}

/// A plugin that could not be started. Only that plugin's files are
/// affected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginLoadError {
  #[error("Plugin '{plugin}' uses protocol version {found}, but version {expected} is required.")]
  ProtocolVersionMismatch { plugin: String, expected: u32, found: u32 },
  #[error("Plugin '{plugin}' declares config key '{found}', but it was registered as '{expected}'.")]
  ConfigKeyMismatch { plugin: String, expected: String, found: String },
  #[error("Plugin '{plugin}' failed to start: {message}")]
  StartFailed { plugin: String, message: String },
}

impl PluginLoadError {
  pub fn plugin(&self) -> &str {
    match self {
      PluginLoadError::ProtocolVersionMismatch { plugin, .. } => plugin,
      PluginLoadError::ConfigKeyMismatch { plugin, .. } => plugin,
      PluginLoadError::StartFailed { plugin, .. } => plugin,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorKind {
  /// The plugin returned an error for the file.
  Plugin,
  /// The plugin did not respond within the formatting timeout.
  Timeout,
  /// The plugin stopped responding entirely.
  Crash,
  /// The platform itself misbehaved (ex. an unstable format).
  Internal,
}

impl std::fmt::Display for FileErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      FileErrorKind::Plugin => write!(f, "plugin error"),
      FileErrorKind::Timeout => write!(f, "timed out"),
      FileErrorKind::Crash => write!(f, "plugin crashed"),
      FileErrorKind::Internal => write!(f, "internal error"),
    }
  }
}

/// An error formatting a single file. The run continues past these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} ({kind}): {message}", .path.display())]
pub struct FileError {
  pub path: PathBuf,
  pub kind: FileErrorKind,
  pub message: String,
}

/// A formatting failure before a path is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
  pub kind: FileErrorKind,
  pub message: String,
}

impl FormatError {
  pub fn for_path(self, path: PathBuf) -> FileError {
    FileError {
      path,
      kind: self.kind,
      message: self.message,
    }
  }
}
