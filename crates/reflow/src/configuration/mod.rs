use indexmap::IndexMap;
use reflow_core::configuration::ConfigKeyMap;
use reflow_core::configuration::GlobalConfiguration;
use reflow_core::plugins::PluginDescriptor;

use crate::error::ConfigurationError;

/// The per-plugin configuration blocks keyed by each plugin's config
/// key, in declaration order.
pub type PluginConfigMap = IndexMap<String, ConfigKeyMap>;

/// A plugin's fully merged option map along with the global
/// configuration it was resolved against.
#[derive(Clone, Debug)]
pub struct ResolvedPluginConfig {
  pub config_key: String,
  pub options: ConfigKeyMap,
  pub global_config: GlobalConfiguration,
}

/// Validates the global configuration and every plugin block, then
/// merges each block with the plugin's option schemas.
///
/// Any unknown plugin block, unknown option key or option type mismatch
/// is fatal. This runs before any file is formatted so a bad
/// configuration never produces a partial run.
pub fn resolve_plugin_configs(
  global_config: &GlobalConfiguration,
  plugin_configs: &PluginConfigMap,
  known_config_keys: &[String],
  descriptors: &[PluginDescriptor],
) -> Result<IndexMap<String, ResolvedPluginConfig>, ConfigurationError> {
  let global_diagnostics = global_config.validate();
  if !global_diagnostics.is_empty() {
    return Err(ConfigurationError::Global {
      diagnostics: global_diagnostics,
    });
  }

  for config_key in plugin_configs.keys() {
    if !known_config_keys.contains(config_key) {
      return Err(ConfigurationError::UnknownPlugin {
        config_key: config_key.clone(),
      });
    }
  }

  let empty_overrides = ConfigKeyMap::new();
  let mut resolved_configs = IndexMap::new();
  for descriptor in descriptors {
    let config_key = &descriptor.info.config_key;
    let overrides = plugin_configs.get(config_key).unwrap_or(&empty_overrides);
    let (options, diagnostics) = descriptor.resolve_options(global_config, overrides);
    if !diagnostics.is_empty() {
      return Err(ConfigurationError::PluginDiagnostics {
        plugin: descriptor.info.name.clone(),
        diagnostics,
      });
    }
    resolved_configs.insert(
      config_key.clone(),
      ResolvedPluginConfig {
        config_key: config_key.clone(),
        options,
        global_config: global_config.clone(),
      },
    );
  }
  Ok(resolved_configs)
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;
  use reflow_core::configuration::ConfigKeyValue;
  use reflow_core::plugins::EmbeddedRegions;
  use reflow_core::plugins::GlobalField;
  use reflow_core::plugins::OptionSchema;
  use reflow_core::plugins::PluginInfo;

  use super::*;

  fn test_descriptor() -> PluginDescriptor {
    PluginDescriptor {
      info: PluginInfo {
        name: "test-plugin".to_string(),
        version: "0.1.0".to_string(),
        config_key: "test".to_string(),
        file_extensions: vec!["txt".to_string()],
        file_names: Vec::new(),
      },
      options: vec![
        OptionSchema::number("lineWidth", 120).inherits(GlobalField::LineWidth),
        OptionSchema::bool("preferHanging", false),
      ],
      embedded: EmbeddedRegions::default(),
    }
  }

  #[test]
  fn errors_on_unknown_plugin_block() {
    let mut plugin_configs = PluginConfigMap::new();
    plugin_configs.insert("nonExistent".to_string(), ConfigKeyMap::new());
    let result = resolve_plugin_configs(&GlobalConfiguration::default(), &plugin_configs, &["test".to_string()], &[test_descriptor()]);
    assert_eq!(
      result.err(),
      Some(ConfigurationError::UnknownPlugin {
        config_key: "nonExistent".to_string(),
      })
    );
  }

  #[test]
  fn errors_on_unknown_option() {
    let mut block = ConfigKeyMap::new();
    block.insert("nonExistentOption".to_string(), ConfigKeyValue::Bool(true));
    let mut plugin_configs = PluginConfigMap::new();
    plugin_configs.insert("test".to_string(), block);
    let result = resolve_plugin_configs(&GlobalConfiguration::default(), &plugin_configs, &["test".to_string()], &[test_descriptor()]);
    assert!(matches!(result, Err(ConfigurationError::PluginDiagnostics { .. })));
  }

  #[test]
  fn errors_on_invalid_global() {
    let global_config = GlobalConfiguration {
      indent_width: 0,
      ..Default::default()
    };
    let result = resolve_plugin_configs(&global_config, &PluginConfigMap::new(), &["test".to_string()], &[test_descriptor()]);
    assert!(matches!(result, Err(ConfigurationError::Global { .. })));
  }

  #[test]
  fn merges_global_into_unmapped_block() {
    let global_config = GlobalConfiguration {
      line_width: 60,
      ..Default::default()
    };
    let resolved = resolve_plugin_configs(&global_config, &PluginConfigMap::new(), &["test".to_string()], &[test_descriptor()]).unwrap();
    let config = resolved.get("test").unwrap();
    assert_eq!(config.options.get("lineWidth"), Some(&ConfigKeyValue::Number(60)));
    assert_eq!(config.options.get("preferHanging"), Some(&ConfigKeyValue::Bool(false)));
  }
}
