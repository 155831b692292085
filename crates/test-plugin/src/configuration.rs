use reflow_core::configuration::get_unknown_property_diagnostics;
use reflow_core::configuration::get_value;
use reflow_core::configuration::ConfigKeyMap;
use reflow_core::configuration::GlobalConfiguration;
use reflow_core::configuration::NewLineKind;
use reflow_core::configuration::ResolveConfigurationResult;
use reflow_core::generate_str_to_from;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
  pub line_width: u32,
  pub indent_width: u8,
  pub use_tabs: bool,
  pub new_line_kind: NewLineKind,
  /// Keep the first argument on the call's line when breaking.
  pub prefer_hanging: bool,
  pub brace_position: BracePosition,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BracePosition {
  #[serde(rename = "sameLine")]
  SameLine,
  #[serde(rename = "nextLine")]
  NextLine,
  #[serde(rename = "sameLineUnlessWide")]
  SameLineUnlessWide,
}

generate_str_to_from![
  BracePosition,
  [SameLine, "sameLine"],
  [NextLine, "nextLine"],
  [SameLineUnlessWide, "sameLineUnlessWide"]
];

pub fn resolve_config(mut config: ConfigKeyMap, global_config: &GlobalConfiguration) -> ResolveConfigurationResult<Configuration> {
  let mut diagnostics = Vec::new();
  let resolved_config = Configuration {
    line_width: get_value(&mut config, "lineWidth", global_config.line_width, &mut diagnostics),
    indent_width: get_value(&mut config, "indentWidth", global_config.indent_width, &mut diagnostics),
    use_tabs: get_value(&mut config, "useTabs", global_config.use_tabs, &mut diagnostics),
    new_line_kind: get_value(&mut config, "newLineKind", global_config.new_line_kind, &mut diagnostics),
    prefer_hanging: get_value(&mut config, "preferHanging", false, &mut diagnostics),
    brace_position: get_value(&mut config, "bracePosition", BracePosition::SameLine, &mut diagnostics),
  };
  diagnostics.extend(get_unknown_property_diagnostics(config));
  ResolveConfigurationResult {
    diagnostics,
    config: resolved_config,
  }
}

#[cfg(test)]
mod test {
  use reflow_core::configuration::ConfigKeyValue;

  use super::*;

  #[test]
  fn inherits_global_values() {
    let global_config = GlobalConfiguration {
      line_width: 60,
      use_tabs: true,
      ..Default::default()
    };
    let result = resolve_config(ConfigKeyMap::new(), &global_config);
    assert_eq!(result.diagnostics.len(), 0);
    assert_eq!(result.config.line_width, 60);
    assert!(result.config.use_tabs);
    assert!(!result.config.prefer_hanging);
  }

  #[test]
  fn diagnostic_for_unknown_property() {
    let mut config = ConfigKeyMap::new();
    config.insert("nonExistentOption".to_string(), ConfigKeyValue::Bool(true));
    let result = resolve_config(config, &GlobalConfiguration::default());
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].property_name, "nonExistentOption");
  }

  #[test]
  fn parses_brace_position() {
    let mut config = ConfigKeyMap::new();
    config.insert("bracePosition".to_string(), ConfigKeyValue::String("nextLine".to_string()));
    let result = resolve_config(config, &GlobalConfiguration::default());
    assert_eq!(result.config.brace_position, BracePosition::NextLine);
  }
}
