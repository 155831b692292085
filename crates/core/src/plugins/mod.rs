use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::configuration::ConfigKeyMap;
use crate::configuration::ConfigKeyValue;
use crate::configuration::ConfigurationDiagnostic;
use crate::configuration::GlobalConfiguration;
use crate::configuration::ResolveConfigurationResult;

mod message_processor;

pub use message_processor::handle_plugin_messages;

/// Information about a plugin.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
  /// The name of the plugin.
  pub name: String,
  /// The version of the plugin.
  pub version: String,
  /// Gets the key in the configuration's plugin block this plugin reads
  /// its options from.
  pub config_key: String,
  /// The file extensions this plugin claims, without the leading dot.
  pub file_extensions: Vec<String>,
  /// The exact file names this plugin claims (ex. "Makefile").
  pub file_names: Vec<String>,
}

/// A field of the global configuration a plugin option may inherit
/// its value from.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GlobalField {
  LineWidth,
  IndentWidth,
  UseTabs,
  NewLineKind,
}

impl GlobalField {
  pub fn value(&self, global_config: &GlobalConfiguration) -> ConfigKeyValue {
    match self {
      GlobalField::LineWidth => ConfigKeyValue::Number(global_config.line_width),
      GlobalField::IndentWidth => ConfigKeyValue::Number(global_config.indent_width as u32),
      GlobalField::UseTabs => ConfigKeyValue::Bool(global_config.use_tabs),
      GlobalField::NewLineKind => ConfigKeyValue::String(global_config.new_line_kind.to_string()),
    }
  }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OptionKind {
  Bool,
  Number,
  String,
  Enum { values: Vec<String> },
}

/// The declaration of a single plugin option. The host validates a
/// configuration block against these before the plugin ever sees it.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OptionSchema {
  pub name: String,
  pub kind: OptionKind,
  pub default: ConfigKeyValue,
  /// When set, the option's value falls back to this global field
  /// before falling back to the default.
  pub inherits: Option<GlobalField>,
}

impl OptionSchema {
  pub fn bool(name: &str, default: bool) -> Self {
    OptionSchema {
      name: name.to_string(),
      kind: OptionKind::Bool,
      default: ConfigKeyValue::Bool(default),
      inherits: None,
    }
  }

  pub fn number(name: &str, default: u32) -> Self {
    OptionSchema {
      name: name.to_string(),
      kind: OptionKind::Number,
      default: ConfigKeyValue::Number(default),
      inherits: None,
    }
  }

  pub fn string(name: &str, default: &str) -> Self {
    OptionSchema {
      name: name.to_string(),
      kind: OptionKind::String,
      default: ConfigKeyValue::String(default.to_string()),
      inherits: None,
    }
  }

  pub fn enum_of(name: &str, values: &[&str], default: &str) -> Self {
    debug_assert!(values.contains(&default));
    OptionSchema {
      name: name.to_string(),
      kind: OptionKind::Enum {
        values: values.iter().map(|value| value.to_string()).collect(),
      },
      default: ConfigKeyValue::String(default.to_string()),
      inherits: None,
    }
  }

  pub fn inherits(mut self, field: GlobalField) -> Self {
    self.inherits = Some(field);
    self
  }

  /// Checks a provided value against this schema's kind.
  pub fn check_value(&self, value: &ConfigKeyValue) -> Result<(), String> {
    match (&self.kind, value) {
      (OptionKind::Bool, ConfigKeyValue::Bool(_)) => Ok(()),
      (OptionKind::Number, ConfigKeyValue::Number(_)) => Ok(()),
      (OptionKind::String, ConfigKeyValue::String(_)) => Ok(()),
      (OptionKind::Enum { values }, ConfigKeyValue::String(text)) => {
        if values.iter().any(|allowed| allowed == text) {
          Ok(())
        } else {
          Err(format!("expected one of {}, found \"{}\"", values.join(", "), text))
        }
      }
      (kind, value) => Err(format!("expected {}, found {}", kind_text(kind), value.kind_text())),
    }
  }
}

fn kind_text(kind: &OptionKind) -> &'static str {
  match kind {
    OptionKind::Bool => "a boolean",
    OptionKind::Number => "a number",
    OptionKind::String => "a string",
    OptionKind::Enum { .. } => "a string",
  }
}

/// The embedded content kinds a plugin participates in. A plugin that
/// emits a kind another plugin handles causes that plugin to be appended
/// to the file's formatting chain.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddedRegions {
  /// Content kinds this plugin emits for other plugins to format.
  pub emits: Vec<String>,
  /// Content kinds this plugin can format on behalf of another plugin.
  pub handles: Vec<String>,
}

/// Everything the host needs to know about a plugin up front.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
  pub info: PluginInfo,
  pub options: Vec<OptionSchema>,
  #[serde(default)]
  pub embedded: EmbeddedRegions,
}

impl PluginDescriptor {
  /// Merges default, inherited global and explicitly provided values
  /// into the full option map the plugin formats with.
  ///
  /// Precedence from lowest to highest is the schema default, the
  /// inherited global field, then the explicit value. Unknown keys and
  /// type mismatches come back as diagnostics.
  pub fn resolve_options(&self, global_config: &GlobalConfiguration, overrides: &ConfigKeyMap) -> (ConfigKeyMap, Vec<ConfigurationDiagnostic>) {
    let mut diagnostics = Vec::new();
    for (key, value) in overrides.iter() {
      match self.options.iter().find(|schema| &schema.name == key) {
        Some(schema) => {
          if let Err(message) = schema.check_value(value) {
            diagnostics.push(ConfigurationDiagnostic {
              property_name: key.clone(),
              message,
            });
          }
        }
        None => diagnostics.push(ConfigurationDiagnostic {
          property_name: key.clone(),
          message: format!("Unknown property in configuration: {}", key),
        }),
      }
    }
    let mut resolved = ConfigKeyMap::new();
    for schema in &self.options {
      let value = match overrides.get(&schema.name) {
        Some(value) if schema.check_value(value).is_ok() => value.clone(),
        _ => match schema.inherits {
          Some(field) => field.value(global_config),
          None => schema.default.clone(),
        },
      };
      resolved.insert(schema.name.clone(), value);
    }
    (resolved, diagnostics)
  }
}

/// The result of formatting. `Ok(None)` means the text was already
/// formatted.
pub type FormatResult = anyhow::Result<Option<String>>;

/// Trait a plugin implements to plug into the formatting platform.
pub trait SyncPluginHandler<TConfiguration: Clone + Serialize> {
  /// The plugin's static descriptor.
  fn descriptor(&mut self) -> PluginDescriptor;

  /// Resolves the host-provided option map into the plugin's typed
  /// configuration.
  fn resolve_config(&mut self, config: ConfigKeyMap, global_config: &GlobalConfiguration) -> ResolveConfigurationResult<TConfiguration>;

  /// Formats the file text.
  fn format(&mut self, file_path: &Path, file_text: &str, config: &TConfiguration) -> FormatResult;
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  fn test_descriptor() -> PluginDescriptor {
    PluginDescriptor {
      info: PluginInfo {
        name: "test".to_string(),
        version: "0.1.0".to_string(),
        config_key: "test".to_string(),
        file_extensions: vec!["txt".to_string()],
        file_names: Vec::new(),
      },
      options: vec![
        OptionSchema::number("lineWidth", 120).inherits(GlobalField::LineWidth),
        OptionSchema::bool("preferHanging", false),
        OptionSchema::enum_of("bracePosition", &["sameLine", "nextLine"], "sameLine"),
      ],
      embedded: EmbeddedRegions::default(),
    }
  }

  #[test]
  fn resolves_defaults_and_inherited_globals() {
    let descriptor = test_descriptor();
    let global_config = GlobalConfiguration {
      line_width: 80,
      ..Default::default()
    };
    let (resolved, diagnostics) = descriptor.resolve_options(&global_config, &ConfigKeyMap::new());
    assert_eq!(diagnostics.len(), 0);
    assert_eq!(resolved.get("lineWidth"), Some(&ConfigKeyValue::Number(80)));
    assert_eq!(resolved.get("preferHanging"), Some(&ConfigKeyValue::Bool(false)));
    assert_eq!(resolved.get("bracePosition"), Some(&ConfigKeyValue::String("sameLine".to_string())));
  }

  #[test]
  fn explicit_value_beats_inherited_global() {
    let descriptor = test_descriptor();
    let global_config = GlobalConfiguration {
      line_width: 80,
      ..Default::default()
    };
    let mut overrides = ConfigKeyMap::new();
    overrides.insert("lineWidth".to_string(), ConfigKeyValue::Number(40));
    let (resolved, diagnostics) = descriptor.resolve_options(&global_config, &overrides);
    assert_eq!(diagnostics.len(), 0);
    assert_eq!(resolved.get("lineWidth"), Some(&ConfigKeyValue::Number(40)));
  }

  #[test]
  fn diagnostics_for_unknown_key_and_bad_type() {
    let descriptor = test_descriptor();
    let mut overrides = ConfigKeyMap::new();
    overrides.insert("nonExistentOption".to_string(), ConfigKeyValue::Bool(true));
    overrides.insert("preferHanging".to_string(), ConfigKeyValue::Number(1));
    overrides.insert("bracePosition".to_string(), ConfigKeyValue::String("upsideDown".to_string()));
    let (_, diagnostics) = descriptor.resolve_options(&GlobalConfiguration::default(), &overrides);
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics[0].property_name, "nonExistentOption");
    assert_eq!(diagnostics[1].property_name, "preferHanging");
    assert_eq!(diagnostics[2].property_name, "bracePosition");
  }
}
