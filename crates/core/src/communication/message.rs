use std::io::Read;
use std::io::Write;

use anyhow::bail;
use anyhow::Result;

use super::reader_writer::MessageReader;
use super::reader_writer::MessageWriter;

/// Version of the wire protocol. A plugin writes this as its first
/// message so the host can reject an incompatible plugin before any
/// other traffic.
pub const PROTOCOL_VERSION: u32 = 1;

/// A message sent between the host and a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMessage {
  /// Identifier correlating a response with its request.
  pub id: u32,
  pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
  /// A request failed. The bytes are a utf8 error message.
  Error(Vec<u8>),
  /// Tells the plugin to shut down.
  Close,
  GetDescriptor,
  /// The plugin's descriptor serialized as json.
  DescriptorResponse(Vec<u8>),
  /// Registers the configuration the plugin should format with. Both
  /// parts are serialized as json.
  RegisterConfig {
    global_config: Vec<u8>,
    plugin_config: Vec<u8>,
  },
  /// Diagnostics produced while resolving a registered configuration,
  /// serialized as json.
  ConfigDiagnosticsResponse(Vec<u8>),
  Format {
    file_path: Vec<u8>,
    file_text: Vec<u8>,
  },
  FormatResponse(FormatResponseBody),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatResponseBody {
  /// The text was already formatted.
  Unchanged,
  /// The formatted text.
  Formatted(Vec<u8>),
}

impl MessageBody {
  fn kind(&self) -> u32 {
    match self {
      MessageBody::Error(_) => 0,
      MessageBody::Close => 1,
      MessageBody::GetDescriptor => 2,
      MessageBody::DescriptorResponse(_) => 3,
      MessageBody::RegisterConfig { .. } => 4,
      MessageBody::ConfigDiagnosticsResponse(_) => 5,
      MessageBody::Format { .. } => 6,
      MessageBody::FormatResponse(_) => 7,
    }
  }
}

impl PluginMessage {
  pub fn read<TRead: Read>(reader: &mut MessageReader<TRead>) -> Result<PluginMessage> {
    let id = reader.read_u32()?;
    let kind = reader.read_u32()?;
    let body = match kind {
      0 => MessageBody::Error(reader.read_sized_bytes()?),
      1 => MessageBody::Close,
      2 => MessageBody::GetDescriptor,
      3 => MessageBody::DescriptorResponse(reader.read_sized_bytes()?),
      4 => MessageBody::RegisterConfig {
        global_config: reader.read_sized_bytes()?,
        plugin_config: reader.read_sized_bytes()?,
      },
      5 => MessageBody::ConfigDiagnosticsResponse(reader.read_sized_bytes()?),
      6 => MessageBody::Format {
        file_path: reader.read_sized_bytes()?,
        file_text: reader.read_sized_bytes()?,
      },
      7 => {
        let response_kind = reader.read_u32()?;
        match response_kind {
          0 => MessageBody::FormatResponse(FormatResponseBody::Unchanged),
          1 => MessageBody::FormatResponse(FormatResponseBody::Formatted(reader.read_sized_bytes()?)),
          _ => bail!("Unknown format response kind: {}", response_kind),
        }
      }
      _ => bail!("Unknown message kind: {}", kind),
    };
    reader.read_success_bytes()?;
    Ok(PluginMessage { id, body })
  }

  pub fn write<TWrite: Write>(&self, writer: &mut MessageWriter<TWrite>) -> Result<()> {
    writer.send_u32(self.id)?;
    writer.send_u32(self.body.kind())?;
    match &self.body {
      MessageBody::Error(bytes) => writer.send_sized_bytes(bytes)?,
      MessageBody::Close => {}
      MessageBody::GetDescriptor => {}
      MessageBody::DescriptorResponse(bytes) => writer.send_sized_bytes(bytes)?,
      MessageBody::RegisterConfig {
        global_config,
        plugin_config,
      } => {
        writer.send_sized_bytes(global_config)?;
        writer.send_sized_bytes(plugin_config)?;
      }
      MessageBody::ConfigDiagnosticsResponse(bytes) => writer.send_sized_bytes(bytes)?,
      MessageBody::Format { file_path, file_text } => {
        writer.send_sized_bytes(file_path)?;
        writer.send_sized_bytes(file_text)?;
      }
      MessageBody::FormatResponse(body) => match body {
        FormatResponseBody::Unchanged => writer.send_u32(0)?,
        FormatResponseBody::Formatted(bytes) => {
          writer.send_u32(1)?;
          writer.send_sized_bytes(bytes)?;
        }
      },
    }
    writer.send_success_bytes()?;
    Ok(())
  }
}
