use std::io::Read;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::communication::FormatResponseBody;
use crate::communication::MessageBody;
use crate::communication::MessageReader;
use crate::communication::MessageWriter;
use crate::communication::PluginMessage;
use crate::communication::PROTOCOL_VERSION;
use crate::configuration::ConfigKeyMap;
use crate::configuration::GlobalConfiguration;

use super::SyncPluginHandler;

/// Runs a plugin's side of the protocol until the host closes it.
///
/// The first bytes written are the protocol version so the host can
/// reject an incompatible plugin before sending any request.
pub fn handle_plugin_messages<TConfiguration, THandler>(mut handler: THandler, reader: impl Read, writer: impl Write) -> Result<()>
where
  TConfiguration: Clone + Serialize,
  THandler: SyncPluginHandler<TConfiguration>,
{
  let mut reader = MessageReader::new(reader);
  let mut writer = MessageWriter::new(writer);
  writer.send_u32(PROTOCOL_VERSION)?;
  writer.send_success_bytes()?;

  let mut config: Option<TConfiguration> = None;
  loop {
    let message = PluginMessage::read(&mut reader)?;
    let response_body = match message.body {
      MessageBody::Close => return Ok(()),
      MessageBody::GetDescriptor => MessageBody::DescriptorResponse(serde_json::to_vec(&handler.descriptor())?),
      MessageBody::RegisterConfig {
        global_config,
        plugin_config,
      } => {
        let global_config: GlobalConfiguration = serde_json::from_slice(&global_config)?;
        let plugin_config: ConfigKeyMap = serde_json::from_slice(&plugin_config)?;
        let result = handler.resolve_config(plugin_config, &global_config);
        config = Some(result.config);
        MessageBody::ConfigDiagnosticsResponse(serde_json::to_vec(&result.diagnostics)?)
      }
      MessageBody::Format { file_path, file_text } => {
        let file_path = PathBuf::from(String::from_utf8(file_path)?);
        let file_text = String::from_utf8(file_text)?;
        match &config {
          Some(config) => match handler.format(&file_path, &file_text, config) {
            Ok(Some(text)) if text != file_text => MessageBody::FormatResponse(FormatResponseBody::Formatted(text.into_bytes())),
            Ok(_) => MessageBody::FormatResponse(FormatResponseBody::Unchanged),
            Err(err) => MessageBody::Error(format!("{:#}", err).into_bytes()),
          },
          None => MessageBody::Error(b"Cannot format because no configuration was registered.".to_vec()),
        }
      }
      _ => MessageBody::Error(b"Unexpected message kind for a plugin.".to_vec()),
    };
    PluginMessage {
      id: message.id,
      body: response_body,
    }
    .write(&mut writer)?;
  }
}
