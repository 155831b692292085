use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use parking_lot::Mutex;

/// The file system and machine the run executes against. Tests swap in
/// an in-memory implementation.
pub trait Environment: Clone + Send + Sync + 'static {
  fn read_file(&self, file_path: &Path) -> Result<String>;
  fn write_file(&self, file_path: &Path, file_text: &str) -> Result<()>;
  fn max_threads(&self) -> usize;
}

#[derive(Clone, Default)]
pub struct RealEnvironment;

impl Environment for RealEnvironment {
  fn read_file(&self, file_path: &Path) -> Result<String> {
    std::fs::read_to_string(file_path).with_context(|| format!("Error reading file {}", file_path.display()))
  }

  fn write_file(&self, file_path: &Path, file_text: &str) -> Result<()> {
    std::fs::write(file_path, file_text).with_context(|| format!("Error writing file {}", file_path.display()))
  }

  fn max_threads(&self) -> usize {
    std::thread::available_parallelism().map(|count| count.get()).unwrap_or(4)
  }
}

/// An in-memory environment for tests.
#[derive(Clone, Default)]
pub struct TestEnvironment {
  files: Arc<Mutex<HashMap<PathBuf, String>>>,
  max_threads: Option<usize>,
}

impl TestEnvironment {
  pub fn new() -> Self {
    TestEnvironment::default()
  }

  pub fn single_threaded() -> Self {
    TestEnvironment {
      max_threads: Some(1),
      ..Default::default()
    }
  }

  pub fn set_file(&self, file_path: impl Into<PathBuf>, file_text: &str) {
    self.files.lock().insert(file_path.into(), file_text.to_string());
  }

  pub fn file_text(&self, file_path: impl AsRef<Path>) -> Option<String> {
    self.files.lock().get(file_path.as_ref()).cloned()
  }

  pub fn file_paths(&self) -> Vec<PathBuf> {
    let mut paths = self.files.lock().keys().cloned().collect::<Vec<_>>();
    paths.sort();
    paths
  }
}

impl Environment for TestEnvironment {
  fn read_file(&self, file_path: &Path) -> Result<String> {
    self
      .files
      .lock()
      .get(file_path)
      .cloned()
      .with_context(|| format!("Could not find file {}", file_path.display()))
  }

  fn write_file(&self, file_path: &Path, file_text: &str) -> Result<()> {
    self.files.lock().insert(file_path.to_path_buf(), file_text.to_string());
    Ok(())
  }

  fn max_threads(&self) -> usize {
    self.max_threads.unwrap_or(4)
  }
}
