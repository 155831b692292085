use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reflow_core::communication::FormatResponseBody;
use reflow_core::communication::MessageBody;
use reflow_core::communication::PROTOCOL_VERSION;
use reflow_core::configuration::ConfigurationDiagnostic;
use reflow_core::configuration::GlobalConfiguration;
use reflow_core::plugins::handle_plugin_messages;
use reflow_core::plugins::PluginDescriptor;
use reflow_core::plugins::SyncPluginHandler;
use serde::Serialize;

use crate::configuration::resolve_plugin_configs;
use crate::configuration::PluginConfigMap;
use crate::error::ConfigurationError;
use crate::error::FileErrorKind;
use crate::error::FormatError;
use crate::error::PluginLoadError;

use super::instance::InstanceError;
use super::instance::InstanceStartError;
use super::instance::PluginInstance;
use super::instance::PluginStarter;

/// A plugin the host knows how to start.
pub struct PluginRegistration {
  pub name: String,
  /// The key of the plugin's block in the configuration. Checked
  /// against the descriptor at load time.
  pub config_key: String,
  pub(crate) starter: PluginStarter,
}

impl PluginRegistration {
  /// A registration with a custom starter. Most plugins should use
  /// [`register`] instead.
  pub fn new(name: &str, config_key: &str, starter: PluginStarter) -> PluginRegistration {
    PluginRegistration {
      name: name.to_string(),
      config_key: config_key.to_string(),
      starter,
    }
  }
}

/// Creates a registration from a handler factory. The factory runs once
/// per started instance so every instance gets its own handler state.
pub fn register<TConfiguration, THandler, TFactory>(name: &str, config_key: &str, create_handler: TFactory) -> PluginRegistration
where
  TConfiguration: Clone + Serialize,
  THandler: SyncPluginHandler<TConfiguration>,
  TFactory: Fn() -> THandler + Send + Sync + 'static,
{
  PluginRegistration {
    name: name.to_string(),
    config_key: config_key.to_string(),
    starter: Arc::new(move |reader, writer| handle_plugin_messages(create_handler(), reader, writer)),
  }
}

struct LoadedPlugin {
  registration: PluginRegistration,
  descriptor: PluginDescriptor,
  global_config_bytes: Vec<u8>,
  options_bytes: Vec<u8>,
  /// Idle instances ready to format. Checked out for the duration of a
  /// request so parallel workers get separate instances.
  pool: Mutex<Vec<PluginInstance>>,
}

/// Owns the loaded plugins and hands out formatting requests to pooled
/// plugin instances.
pub struct PluginHost {
  plugins: Vec<LoadedPlugin>,
  timeout: Duration,
}

impl PluginHost {
  /// Starts every registered plugin, fetches descriptors, validates the
  /// configuration and registers it with each plugin.
  ///
  /// A configuration problem is fatal. A plugin that fails to start is
  /// not: it comes back as a load error and only its files are
  /// affected.
  pub fn load(
    registrations: Vec<PluginRegistration>,
    global_config: &GlobalConfiguration,
    plugin_configs: &PluginConfigMap,
    timeout: Duration,
  ) -> Result<(PluginHost, Vec<PluginLoadError>), ConfigurationError> {
    let known_config_keys = registrations.iter().map(|registration| registration.config_key.clone()).collect::<Vec<_>>();
    let mut load_errors = Vec::new();
    let mut started = Vec::new();
    for registration in registrations {
      match start_and_describe(&registration, timeout) {
        Ok((instance, descriptor)) => {
          if descriptor.info.config_key != registration.config_key {
            load_errors.push(PluginLoadError::ConfigKeyMismatch {
              plugin: registration.name.clone(),
              expected: registration.config_key.clone(),
              found: descriptor.info.config_key.clone(),
            });
            instance.shutdown();
          } else {
            started.push((registration, descriptor, instance));
          }
        }
        Err(err) => {
          log::warn!("{}", err);
          load_errors.push(err);
        }
      }
    }

    let descriptors = started.iter().map(|(_, descriptor, _)| descriptor.clone()).collect::<Vec<_>>();
    let resolved_configs = resolve_plugin_configs(global_config, plugin_configs, &known_config_keys, &descriptors)?;

    let mut plugins = Vec::new();
    for (registration, descriptor, mut instance) in started {
      let resolved = &resolved_configs[&descriptor.info.config_key];
      let global_config_bytes = match serde_json::to_vec(global_config) {
        Ok(bytes) => bytes,
        Err(err) => {
          load_errors.push(PluginLoadError::StartFailed {
            plugin: registration.name.clone(),
            message: err.to_string(),
          });
          continue;
        }
      };
      let options_bytes = match serde_json::to_vec(&resolved.options) {
        Ok(bytes) => bytes,
        Err(err) => {
          load_errors.push(PluginLoadError::StartFailed {
            plugin: registration.name.clone(),
            message: err.to_string(),
          });
          continue;
        }
      };
      let diagnostics = match register_config(&mut instance, &global_config_bytes, &options_bytes, timeout) {
        Ok(diagnostics) => diagnostics,
        Err(message) => {
          load_errors.push(PluginLoadError::StartFailed {
            plugin: registration.name.clone(),
            message,
          });
          continue;
        }
      };
      if !diagnostics.is_empty() {
        return Err(ConfigurationError::PluginDiagnostics {
          plugin: registration.name.clone(),
          diagnostics,
        });
      }
      plugins.push(LoadedPlugin {
        registration,
        descriptor,
        global_config_bytes,
        options_bytes,
        pool: Mutex::new(vec![instance]),
      });
    }

    Ok((PluginHost { plugins, timeout }, load_errors))
  }

  pub fn descriptors(&self) -> Vec<&PluginDescriptor> {
    self.plugins.iter().map(|plugin| &plugin.descriptor).collect()
  }

  pub fn plugin_name(&self, plugin_index: usize) -> &str {
    &self.plugins[plugin_index].registration.name
  }

  /// Formats a file with the plugin at the provided index. `Ok(None)`
  /// means the text was already formatted.
  ///
  /// A timed out or crashed instance is discarded and the next request
  /// for the plugin gets a fresh one.
  pub fn format_file(&self, plugin_index: usize, file_path: &Path, file_text: &str) -> Result<Option<String>, FormatError> {
    let plugin = &self.plugins[plugin_index];
    let existing_instance = plugin.pool.lock().pop();
    let mut instance = match existing_instance {
      Some(instance) => instance,
      None => self.start_fresh_instance(plugin)?,
    };
    let request_body = MessageBody::Format {
      file_path: file_path.to_string_lossy().into_owned().into_bytes(),
      file_text: file_text.as_bytes().to_vec(),
    };
    match instance.request(request_body, self.timeout) {
      Ok(MessageBody::FormatResponse(FormatResponseBody::Unchanged)) => {
        plugin.pool.lock().push(instance);
        Ok(None)
      }
      Ok(MessageBody::FormatResponse(FormatResponseBody::Formatted(bytes))) => {
        plugin.pool.lock().push(instance);
        match String::from_utf8(bytes) {
          Ok(text) => Ok(Some(text)),
          Err(err) => Err(FormatError {
            kind: FileErrorKind::Internal,
            message: format!("Plugin returned invalid utf8: {}", err),
          }),
        }
      }
      Ok(MessageBody::Error(bytes)) => {
        plugin.pool.lock().push(instance);
        Err(FormatError {
          kind: FileErrorKind::Plugin,
          message: String::from_utf8_lossy(&bytes).into_owned(),
        })
      }
      Ok(_) => Err(FormatError {
        kind: FileErrorKind::Internal,
        message: "Unexpected response kind from plugin.".to_string(),
      }),
      Err(InstanceError::Timeout) => Err(FormatError {
        kind: FileErrorKind::Timeout,
        message: format!("Formatting timed out after {}ms.", self.timeout.as_millis()),
      }),
      Err(InstanceError::Closed(message)) => Err(FormatError {
        kind: FileErrorKind::Crash,
        message,
      }),
    }
  }

  pub fn shutdown(self) {
    for plugin in self.plugins {
      for instance in plugin.pool.into_inner() {
        instance.shutdown();
      }
    }
  }

  fn start_fresh_instance(&self, plugin: &LoadedPlugin) -> Result<PluginInstance, FormatError> {
    log::debug!("Starting a fresh instance of plugin '{}'.", plugin.registration.name);
    let mut instance = PluginInstance::start(&plugin.registration.starter).map_err(|err| FormatError {
      kind: FileErrorKind::Crash,
      message: err.to_string(),
    })?;
    // the configuration was validated at load, so diagnostics are not
    // expected here
    register_config(&mut instance, &plugin.global_config_bytes, &plugin.options_bytes, self.timeout).map_err(|message| FormatError {
      kind: FileErrorKind::Crash,
      message,
    })?;
    Ok(instance)
  }
}

fn start_and_describe(registration: &PluginRegistration, timeout: Duration) -> Result<(PluginInstance, PluginDescriptor), PluginLoadError> {
  let mut instance = PluginInstance::start(&registration.starter).map_err(|err| match err {
    InstanceStartError::VersionMismatch { found } => PluginLoadError::ProtocolVersionMismatch {
      plugin: registration.name.clone(),
      expected: PROTOCOL_VERSION,
      found,
    },
    InstanceStartError::Failed(message) => PluginLoadError::StartFailed {
      plugin: registration.name.clone(),
      message,
    },
  })?;
  let start_failed = |message: String| PluginLoadError::StartFailed {
    plugin: registration.name.clone(),
    message,
  };
  let body = instance
    .request(MessageBody::GetDescriptor, timeout)
    .map_err(|err| start_failed(err.to_string()))?;
  let descriptor = match body {
    MessageBody::DescriptorResponse(bytes) => serde_json::from_slice(&bytes).map_err(|err| start_failed(err.to_string()))?,
    MessageBody::Error(bytes) => return Err(start_failed(String::from_utf8_lossy(&bytes).into_owned())),
    _ => return Err(start_failed("Unexpected response to the descriptor request.".to_string())),
  };
  Ok((instance, descriptor))
}

fn register_config(instance: &mut PluginInstance, global_config_bytes: &[u8], options_bytes: &[u8], timeout: Duration) -> Result<Vec<ConfigurationDiagnostic>, String> {
  let body = MessageBody::RegisterConfig {
    global_config: global_config_bytes.to_vec(),
    plugin_config: options_bytes.to_vec(),
  };
  match instance.request(body, timeout) {
    Ok(MessageBody::ConfigDiagnosticsResponse(bytes)) => serde_json::from_slice(&bytes).map_err(|err| err.to_string()),
    Ok(MessageBody::Error(bytes)) => Err(String::from_utf8_lossy(&bytes).into_owned()),
    Ok(_) => Err("Unexpected response to the configuration request.".to_string()),
    Err(err) => Err(err.to_string()),
  }
}
