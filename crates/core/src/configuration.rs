use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfigurationError(pub String);

impl std::fmt::Display for ParseConfigurationError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Found invalid value '{}'.", self.0)
  }
}

impl std::error::Error for ParseConfigurationError {}

/// Generates `FromStr`/`Display` implementations for a configuration
/// enum along with conversion from a `ConfigKeyValue`.
#[macro_export]
macro_rules! generate_str_to_from {
  ($enum_name:ident, $([$member_name:ident, $string_value:expr]),* ) => {
    impl std::str::FromStr for $enum_name {
      type Err = $crate::configuration::ParseConfigurationError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
          $($string_value => Ok($enum_name::$member_name)),*,
          _ => Err($crate::configuration::ParseConfigurationError(String::from(s))),
        }
      }
    }

    impl std::fmt::Display for $enum_name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
          $($enum_name::$member_name => write!(f, "{}", $string_value)),*,
        }
      }
    }

    impl $crate::configuration::FromConfigKeyValue for $enum_name {
      fn from_config_key_value(value: &$crate::configuration::ConfigKeyValue) -> Result<Self, String> {
        match value {
          $crate::configuration::ConfigKeyValue::String(text) => {
            text.parse::<$enum_name>().map_err(|err| err.to_string())
          }
          _ => Err(format!("expected a string value, found {}", value.kind_text())),
        }
      }
    }
  };
}

#[derive(Clone, PartialEq, Eq, Debug, Copy, Serialize, Deserialize)]
pub enum NewLineKind {
  /// Decide which newline kind to use based on the last newline in the file.
  #[serde(rename = "auto")]
  Auto,
  /// Use slash n new lines.
  #[serde(rename = "lf")]
  LineFeed,
  /// Use slash r slash n new lines.
  #[serde(rename = "crlf")]
  CarriageReturnLineFeed,
  /// Use the system standard (ex. crlf on Windows).
  #[serde(rename = "system")]
  System,
}

generate_str_to_from![
  NewLineKind,
  [Auto, "auto"],
  [LineFeed, "lf"],
  [CarriageReturnLineFeed, "crlf"],
  [System, "system"]
];

/// A value in a plugin's configuration block.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigKeyValue {
  String(String),
  Number(u32),
  Bool(bool),
}

impl ConfigKeyValue {
  pub fn kind_text(&self) -> &'static str {
    match self {
      ConfigKeyValue::String(_) => "a string",
      ConfigKeyValue::Number(_) => "a number",
      ConfigKeyValue::Bool(_) => "a boolean",
    }
  }

  pub fn display_text(&self) -> String {
    match self {
      ConfigKeyValue::String(value) => format!("\"{}\"", value),
      ConfigKeyValue::Number(value) => value.to_string(),
      ConfigKeyValue::Bool(value) => value.to_string(),
    }
  }
}

impl From<&str> for ConfigKeyValue {
  fn from(value: &str) -> Self {
    ConfigKeyValue::String(value.to_string())
  }
}

impl From<String> for ConfigKeyValue {
  fn from(value: String) -> Self {
    ConfigKeyValue::String(value)
  }
}

impl From<u32> for ConfigKeyValue {
  fn from(value: u32) -> Self {
    ConfigKeyValue::Number(value)
  }
}

impl From<bool> for ConfigKeyValue {
  fn from(value: bool) -> Self {
    ConfigKeyValue::Bool(value)
  }
}

/// A plugin's configuration block as provided by the configuration source.
///
/// An `IndexMap` so that iteration order matches declaration order and
/// diagnostics come out deterministically.
pub type ConfigKeyMap = IndexMap<String, ConfigKeyValue>;

/// Conversion from a raw configuration value to a typed option value.
pub trait FromConfigKeyValue: Sized {
  fn from_config_key_value(value: &ConfigKeyValue) -> Result<Self, String>;
}

impl FromConfigKeyValue for bool {
  fn from_config_key_value(value: &ConfigKeyValue) -> Result<Self, String> {
    match value {
      ConfigKeyValue::Bool(value) => Ok(*value),
      _ => Err(format!("expected a boolean, found {}", value.kind_text())),
    }
  }
}

impl FromConfigKeyValue for u32 {
  fn from_config_key_value(value: &ConfigKeyValue) -> Result<Self, String> {
    match value {
      ConfigKeyValue::Number(value) => Ok(*value),
      _ => Err(format!("expected a number, found {}", value.kind_text())),
    }
  }
}

impl FromConfigKeyValue for u8 {
  fn from_config_key_value(value: &ConfigKeyValue) -> Result<Self, String> {
    match value {
      ConfigKeyValue::Number(value) if *value <= u8::MAX as u32 => Ok(*value as u8),
      ConfigKeyValue::Number(value) => Err(format!("value {} is out of range", value)),
      _ => Err(format!("expected a number, found {}", value.kind_text())),
    }
  }
}

impl FromConfigKeyValue for String {
  fn from_config_key_value(value: &ConfigKeyValue) -> Result<Self, String> {
    match value {
      ConfigKeyValue::String(value) => Ok(value.clone()),
      _ => Err(format!("expected a string, found {}", value.kind_text())),
    }
  }
}

/// Represents a problem within the configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDiagnostic {
  /// The property name the problem occurred on.
  pub property_name: String,
  /// The diagnostic message that should be displayed to the user.
  pub message: String,
}

impl std::fmt::Display for ConfigurationDiagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} ({})", self.message, self.property_name)
  }
}

/// The global configuration shared by every plugin.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfiguration {
  pub line_width: u32,
  pub indent_width: u8,
  pub use_tabs: bool,
  pub new_line_kind: NewLineKind,
  pub includes: Vec<String>,
  pub excludes: Vec<String>,
}

impl Default for GlobalConfiguration {
  fn default() -> Self {
    GlobalConfiguration {
      line_width: 120,
      indent_width: 4,
      use_tabs: false,
      new_line_kind: NewLineKind::LineFeed,
      includes: vec!["**/*".to_string()],
      excludes: Vec::new(),
    }
  }
}

impl GlobalConfiguration {
  /// Checks the numeric invariants, returning a diagnostic per violation.
  pub fn validate(&self) -> Vec<ConfigurationDiagnostic> {
    let mut diagnostics = Vec::new();
    if self.line_width == 0 {
      diagnostics.push(ConfigurationDiagnostic {
        property_name: "lineWidth".to_string(),
        message: "lineWidth must be a positive integer".to_string(),
      });
    }
    if self.indent_width == 0 {
      diagnostics.push(ConfigurationDiagnostic {
        property_name: "indentWidth".to_string(),
        message: "indentWidth must be a positive integer".to_string(),
      });
    }
    diagnostics
  }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConfigurationResult<T: Clone + Serialize> {
  /// The configuration diagnostics.
  pub diagnostics: Vec<ConfigurationDiagnostic>,
  /// The configuration derived from the unresolved configuration
  /// that can be used to format a file.
  pub config: T,
}

/// If the provided key exists, takes its value from the provided config and returns it.
/// If the provided key does not exist, it returns the default value.
/// Adds a diagnostic if there is any problem converting the value.
pub fn get_value<T: FromConfigKeyValue>(
  config: &mut ConfigKeyMap,
  key: &'static str,
  default_value: T,
  diagnostics: &mut Vec<ConfigurationDiagnostic>,
) -> T {
  get_nullable_value(config, key, diagnostics).unwrap_or(default_value)
}

pub fn get_nullable_value<T: FromConfigKeyValue>(
  config: &mut ConfigKeyMap,
  key: &'static str,
  diagnostics: &mut Vec<ConfigurationDiagnostic>,
) -> Option<T> {
  let value = match config.get(key) {
    Some(raw_value) => match T::from_config_key_value(raw_value) {
      Ok(value) => Some(value),
      Err(message) => {
        diagnostics.push(ConfigurationDiagnostic {
          property_name: String::from(key),
          message: format!("Error resolving configuration value for '{}'. Message: {}", key, message),
        });
        None
      }
    },
    None => None,
  };
  config.shift_remove(key);
  value
}

/// Gets a diagnostic for each remaining key value pair in the map.
///
/// This should be done last, so it swallows the map.
pub fn get_unknown_property_diagnostics(config: ConfigKeyMap) -> Vec<ConfigurationDiagnostic> {
  let mut diagnostics = Vec::new();
  for (key, _) in config.iter() {
    diagnostics.push(ConfigurationDiagnostic {
      property_name: String::from(key),
      message: format!("Unknown property in configuration: {}", key),
    });
  }
  diagnostics
}

/// Resolves the newline text from the provided file text and `NewLineKind`.
pub fn resolve_new_line_kind(file_text: &str, new_line_kind: NewLineKind) -> &'static str {
  match new_line_kind {
    NewLineKind::LineFeed => "\n",
    NewLineKind::CarriageReturnLineFeed => "\r\n",
    NewLineKind::Auto => {
      let mut found_slash_n = false;
      for c in file_text.as_bytes().iter().rev() {
        if found_slash_n {
          if c == &b'\r' {
            return "\r\n";
          } else {
            return "\n";
          }
        }
        if c == &b'\n' {
          found_slash_n = true;
        }
      }
      "\n"
    }
    NewLineKind::System => {
      if cfg!(windows) {
        "\r\n"
      } else {
        "\n"
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn gets_value_with_default() {
    let mut config = ConfigKeyMap::new();
    config.insert("lineWidth".to_string(), ConfigKeyValue::Number(80));
    let mut diagnostics = Vec::new();
    let value: u32 = get_value(&mut config, "lineWidth", 120, &mut diagnostics);
    assert_eq!(value, 80);
    let missing: u32 = get_value(&mut config, "indentWidth", 4, &mut diagnostics);
    assert_eq!(missing, 4);
    assert_eq!(diagnostics.len(), 0);
    assert!(config.is_empty());
  }

  #[test]
  fn diagnostic_on_wrong_type() {
    let mut config = ConfigKeyMap::new();
    config.insert("useTabs".to_string(), ConfigKeyValue::Number(1));
    let mut diagnostics = Vec::new();
    let value: bool = get_value(&mut config, "useTabs", false, &mut diagnostics);
    assert_eq!(value, false);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].property_name, "useTabs");
  }

  #[test]
  fn diagnostics_for_unknown_properties() {
    let mut config = ConfigKeyMap::new();
    config.insert("unknown1".to_string(), ConfigKeyValue::Bool(true));
    config.insert("unknown2".to_string(), ConfigKeyValue::Number(2));
    let diagnostics = get_unknown_property_diagnostics(config);
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].property_name, "unknown1");
    assert_eq!(diagnostics[1].property_name, "unknown2");
  }

  #[test]
  fn parses_new_line_kind() {
    assert_eq!("auto".parse::<NewLineKind>().unwrap(), NewLineKind::Auto);
    assert_eq!("lf".parse::<NewLineKind>().unwrap(), NewLineKind::LineFeed);
    assert_eq!("crlf".parse::<NewLineKind>().unwrap(), NewLineKind::CarriageReturnLineFeed);
    assert!("invalid".parse::<NewLineKind>().is_err());
  }

  #[test]
  fn resolves_auto_new_line_kind() {
    assert_eq!(resolve_new_line_kind("test\n", NewLineKind::Auto), "\n");
    assert_eq!(resolve_new_line_kind("test\r\n", NewLineKind::Auto), "\r\n");
    assert_eq!(resolve_new_line_kind("test", NewLineKind::Auto), "\n");
    assert_eq!(resolve_new_line_kind("first\r\nsecond\n", NewLineKind::Auto), "\n");
  }

  #[test]
  fn validates_global_configuration() {
    let config = GlobalConfiguration {
      line_width: 0,
      ..Default::default()
    };
    let diagnostics = config.validate();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].property_name, "lineWidth");
    assert!(GlobalConfiguration::default().validate().is_empty());
  }
}
