mod configuration;
mod generation;
mod parsing;

use std::path::Path;

use anyhow::Result;
use reflow_core::configuration::resolve_new_line_kind;
use reflow_core::configuration::ConfigKeyMap;
use reflow_core::configuration::GlobalConfiguration;
use reflow_core::configuration::ResolveConfigurationResult;
use reflow_core::formatting;
use reflow_core::formatting::PrintOptions;
use reflow_core::plugins::EmbeddedRegions;
use reflow_core::plugins::FormatResult;
use reflow_core::plugins::GlobalField;
use reflow_core::plugins::OptionSchema;
use reflow_core::plugins::PluginDescriptor;
use reflow_core::plugins::PluginInfo;
use reflow_core::plugins::SyncPluginHandler;

pub use configuration::BracePosition;
pub use configuration::Configuration;

/// Formats the "blok" test language: newline separated statements made
/// of words, calls and braced blocks.
pub struct BlokPluginHandler;

impl SyncPluginHandler<Configuration> for BlokPluginHandler {
  fn descriptor(&mut self) -> PluginDescriptor {
    PluginDescriptor {
      info: PluginInfo {
        name: "reflow-test-plugin".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        config_key: "blok".to_string(),
        file_extensions: vec!["blok".to_string()],
        file_names: vec!["Blokfile".to_string()],
      },
      options: vec![
        OptionSchema::number("lineWidth", 120).inherits(GlobalField::LineWidth),
        OptionSchema::number("indentWidth", 4).inherits(GlobalField::IndentWidth),
        OptionSchema::bool("useTabs", false).inherits(GlobalField::UseTabs),
        OptionSchema::enum_of("newLineKind", &["auto", "lf", "crlf", "system"], "lf").inherits(GlobalField::NewLineKind),
        OptionSchema::bool("preferHanging", false),
        OptionSchema::enum_of("bracePosition", &["sameLine", "nextLine", "sameLineUnlessWide"], "sameLine"),
      ],
      embedded: EmbeddedRegions::default(),
    }
  }

  fn resolve_config(&mut self, config: ConfigKeyMap, global_config: &GlobalConfiguration) -> ResolveConfigurationResult<Configuration> {
    configuration::resolve_config(config, global_config)
  }

  fn format(&mut self, _file_path: &Path, file_text: &str, config: &Configuration) -> FormatResult {
    format_text(file_text, config).map(Some)
  }
}

pub fn format_text(file_text: &str, config: &Configuration) -> Result<String> {
  let file = parsing::parse(file_text)?;
  let new_line_text = resolve_new_line_kind(file_text, config.new_line_kind);
  let items = generation::generate(&file, config);
  let text = formatting::format(
    &items,
    &PrintOptions {
      max_width: config.line_width,
      indent_width: config.indent_width,
      use_tabs: config.use_tabs,
      new_line_text,
    },
  )?;
  if text.is_empty() {
    Ok(String::new())
  } else {
    Ok(format!("{}{}", text, new_line_text))
  }
}
