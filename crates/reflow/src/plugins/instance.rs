use std::io::Read;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;
use crossbeam_channel::Sender;
use reflow_core::communication::MessageBody;
use reflow_core::communication::MessageReader;
use reflow_core::communication::MessageWriter;
use reflow_core::communication::PluginMessage;
use reflow_core::communication::PROTOCOL_VERSION;
use thiserror::Error;

/// Starts a plugin's message loop over the provided byte streams.
pub type PluginStarter = Arc<dyn Fn(PipeReader, PipeWriter) -> Result<()> + Send + Sync>;

/// An in-memory byte stream connecting the host to a plugin thread.
/// Reads block until the writing side sends bytes or hangs up.
pub fn pipe() -> (PipeWriter, PipeReader) {
  let (sender, receiver) = crossbeam_channel::unbounded();
  (
    PipeWriter { sender },
    PipeReader {
      receiver,
      current: Vec::new(),
      position: 0,
    },
  )
}

pub struct PipeWriter {
  sender: Sender<Vec<u8>>,
}

impl Write for PipeWriter {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    self
      .sender
      .send(buf.to_vec())
      .map_err(|_| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "the reading side hung up"))?;
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

pub struct PipeReader {
  receiver: Receiver<Vec<u8>>,
  current: Vec<u8>,
  position: usize,
}

impl Read for PipeReader {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
    while self.position >= self.current.len() {
      match self.receiver.recv() {
        Ok(chunk) => {
          self.current = chunk;
          self.position = 0;
        }
        Err(_) => return Ok(0),
      }
    }
    let available = &self.current[self.position..];
    let count = available.len().min(buf.len());
    buf[..count].copy_from_slice(&available[..count]);
    self.position += count;
    Ok(count)
  }
}

#[derive(Error, Debug)]
pub enum InstanceStartError {
  #[error("The plugin reported protocol version {found}.")]
  VersionMismatch { found: u32 },
  #[error("{0}")]
  Failed(String),
}

#[derive(Error, Debug)]
pub enum InstanceError {
  #[error("The plugin did not respond in time.")]
  Timeout,
  #[error("{0}")]
  Closed(String),
}

/// A single running plugin worker. Requests are sequential, so an
/// instance serves one file at a time and the host pools them.
pub struct PluginInstance {
  writer: MessageWriter<PipeWriter>,
  responses: Receiver<PluginMessage>,
  next_message_id: u32,
}

impl PluginInstance {
  /// Spawns the plugin on its own thread and performs the protocol
  /// version handshake. A panicking plugin only takes down its own
  /// thread.
  pub fn start(starter: &PluginStarter) -> Result<PluginInstance, InstanceStartError> {
    let (host_writer, plugin_reader) = pipe();
    let (plugin_writer, host_reader) = pipe();
    let starter = starter.clone();
    std::thread::Builder::new()
      .name("reflow-plugin".to_string())
      .spawn(move || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| starter(plugin_reader, plugin_writer)));
        match result {
          Ok(Ok(())) => {}
          Ok(Err(err)) => log::debug!("Plugin stopped with an error: {:#}", err),
          Err(_) => log::debug!("Plugin panicked."),
        }
      })
      .map_err(|err| InstanceStartError::Failed(err.to_string()))?;

    let mut reader = MessageReader::new(host_reader);
    let version = read_version(&mut reader).map_err(|err| InstanceStartError::Failed(err.to_string()))?;
    if version != PROTOCOL_VERSION {
      return Err(InstanceStartError::VersionMismatch { found: version });
    }

    let (response_sender, responses) = crossbeam_channel::unbounded();
    std::thread::Builder::new()
      .name("reflow-plugin-reader".to_string())
      .spawn(move || {
        while let Ok(message) = PluginMessage::read(&mut reader) {
          if response_sender.send(message).is_err() {
            break;
          }
        }
      })
      .map_err(|err| InstanceStartError::Failed(err.to_string()))?;

    Ok(PluginInstance {
      writer: MessageWriter::new(host_writer),
      responses,
      next_message_id: 0,
    })
  }

  /// Sends a request and waits for its response. A timed out or hung up
  /// instance must be discarded by the caller.
  pub fn request(&mut self, body: MessageBody, timeout: Duration) -> Result<MessageBody, InstanceError> {
    let id = self.next_message_id;
    self.next_message_id += 1;
    PluginMessage { id, body }
      .write(&mut self.writer)
      .map_err(|err| InstanceError::Closed(err.to_string()))?;
    match self.responses.recv_timeout(timeout) {
      Ok(message) if message.id == id => Ok(message.body),
      Ok(message) => Err(InstanceError::Closed(format!("Expected a response to message {}, but found {}.", id, message.id))),
      Err(RecvTimeoutError::Timeout) => Err(InstanceError::Timeout),
      Err(RecvTimeoutError::Disconnected) => Err(InstanceError::Closed("The plugin stopped responding.".to_string())),
    }
  }

  /// Tells the plugin to exit. Dropping an instance also stops it by
  /// closing its pipes, but this lets it shut down cleanly.
  pub fn shutdown(mut self) {
    let id = self.next_message_id;
    let _ = PluginMessage {
      id,
      body: MessageBody::Close,
    }
    .write(&mut self.writer);
  }
}

fn read_version(reader: &mut MessageReader<PipeReader>) -> Result<u32> {
  let version = reader.read_u32()?;
  reader.read_success_bytes()?;
  Ok(version)
}
