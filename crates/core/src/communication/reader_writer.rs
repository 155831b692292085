use std::io::Read;
use std::io::Write;

use anyhow::bail;
use anyhow::Result;

/// Trailer written at the end of every message so a torn or corrupted
/// stream is caught at the message boundary.
pub const SUCCESS_BYTES: [u8; 4] = [255, 255, 255, 255];

pub struct MessageReader<TRead: Read> {
  reader: TRead,
}

impl<TRead: Read> MessageReader<TRead> {
  pub fn new(reader: TRead) -> Self {
    MessageReader { reader }
  }

  /// Reads a little endian u32.
  pub fn read_u32(&mut self) -> Result<u32> {
    let mut buf = [0u8; 4];
    self.reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
  }

  /// Reads a u32 length then that many bytes.
  pub fn read_sized_bytes(&mut self) -> Result<Vec<u8>> {
    let size = self.read_u32()? as usize;
    let mut bytes = vec![0u8; size];
    self.reader.read_exact(&mut bytes)?;
    Ok(bytes)
  }

  pub fn read_success_bytes(&mut self) -> Result<()> {
    let mut buf = [0u8; 4];
    self.reader.read_exact(&mut buf)?;
    if buf == SUCCESS_BYTES {
      Ok(())
    } else {
      bail!("Catastrophic error. Expected success bytes, but found: {:?}", buf)
    }
  }
}

pub struct MessageWriter<TWrite: Write> {
  writer: TWrite,
}

impl<TWrite: Write> MessageWriter<TWrite> {
  pub fn new(writer: TWrite) -> Self {
    MessageWriter { writer }
  }

  /// Writes a little endian u32.
  pub fn send_u32(&mut self, value: u32) -> Result<()> {
    self.writer.write_all(&value.to_le_bytes())?;
    Ok(())
  }

  /// Writes a u32 length then the bytes.
  pub fn send_sized_bytes(&mut self, bytes: &[u8]) -> Result<()> {
    self.send_u32(bytes.len() as u32)?;
    self.writer.write_all(bytes)?;
    Ok(())
  }

  pub fn send_success_bytes(&mut self) -> Result<()> {
    self.writer.write_all(&SUCCESS_BYTES)?;
    self.writer.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn round_trips_values() {
    let mut buf = Vec::new();
    {
      let mut writer = MessageWriter::new(&mut buf);
      writer.send_u32(579).unwrap();
      writer.send_sized_bytes("testing".as_bytes()).unwrap();
      writer.send_success_bytes().unwrap();
    }
    let mut reader = MessageReader::new(buf.as_slice());
    assert_eq!(reader.read_u32().unwrap(), 579);
    assert_eq!(reader.read_sized_bytes().unwrap(), "testing".as_bytes());
    reader.read_success_bytes().unwrap();
  }

  #[test]
  fn errors_on_bad_success_bytes() {
    let mut buf = Vec::new();
    {
      let mut writer = MessageWriter::new(&mut buf);
      writer.send_u32(1).unwrap();
    }
    let mut reader = MessageReader::new(buf.as_slice());
    assert!(reader.read_success_bytes().is_err());
  }

  #[test]
  fn uses_little_endian() {
    let mut buf = Vec::new();
    {
      let mut writer = MessageWriter::new(&mut buf);
      writer.send_u32(1).unwrap();
    }
    assert_eq!(buf, vec![1, 0, 0, 0]);
  }
}
