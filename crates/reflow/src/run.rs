use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use parking_lot::Mutex;
use reflow_core::configuration::ConfigurationDiagnostic;
use reflow_core::configuration::GlobalConfiguration;

use crate::configuration::PluginConfigMap;
use crate::environment::Environment;
use crate::error::ConfigurationError;
use crate::error::FileError;
use crate::error::FileErrorKind;
use crate::error::FormatError;
use crate::error::PluginLoadError;
use crate::plugins::PluginHost;
use crate::plugins::PluginRegistration;
use crate::routing::FileRouter;
use crate::routing::GlobMatcher;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunMode {
  /// Write formatted output back to the files.
  Format,
  /// Report the files that would change without writing anything.
  Check,
}

/// The outcome of a run over a set of files.
#[derive(Debug)]
pub struct RunResult {
  pub mode: RunMode,
  /// Count of files considered, whether or not a plugin claimed them.
  pub total: usize,
  /// Files whose text changed, sorted by path.
  pub changed: Vec<PathBuf>,
  /// Count of files that were already formatted.
  pub unchanged: usize,
  /// Per file failures, sorted by path. The run continues past these.
  pub errors: Vec<FileError>,
  /// Plugins that could not be loaded. Their files were not processed.
  pub load_errors: Vec<PluginLoadError>,
}

impl RunResult {
  pub fn is_success(&self) -> bool {
    self.errors.is_empty() && self.load_errors.is_empty() && (self.mode == RunMode::Format || self.changed.is_empty())
  }
}

enum FileOutcome {
  Changed,
  Unchanged,
  Failed(FileError),
}

/// Formats or checks the provided files.
///
/// Loads the plugins, validates the configuration, routes each file to
/// its plugin chain and fans the work out over a worker pool. Results
/// come back in path order regardless of which worker finished first.
pub fn run<TEnvironment: Environment>(
  environment: &TEnvironment,
  registrations: Vec<PluginRegistration>,
  global_config: &GlobalConfiguration,
  plugin_configs: &PluginConfigMap,
  file_paths: Vec<PathBuf>,
  mode: RunMode,
  timeout: Duration,
) -> Result<RunResult, ConfigurationError> {
  let start_instant = Instant::now();
  let (host, load_errors) = PluginHost::load(registrations, global_config, plugin_configs, timeout)?;
  let matcher = GlobMatcher::new(&global_config.includes, &global_config.excludes).map_err(|err| ConfigurationError::Global {
    diagnostics: vec![ConfigurationDiagnostic {
      property_name: "includes".to_string(),
      message: err.to_string(),
    }],
  })?;
  let router = FileRouter::new(&host.descriptors(), matcher);

  let (work_sender, work_receiver) = crossbeam_channel::unbounded();
  let total = file_paths.len();
  let mut routed = 0;
  for file_path in file_paths {
    let chain = router.route(&file_path);
    if chain.is_empty() {
      log::debug!("No plugin for {}.", file_path.display());
      continue;
    }
    routed += 1;
    // the channel is unbounded, so this never blocks
    let _ = work_sender.send((file_path, chain));
  }
  drop(work_sender);

  let results: Mutex<Vec<(PathBuf, FileOutcome)>> = Mutex::new(Vec::with_capacity(routed));
  let thread_count = environment.max_threads().min(routed).max(1);
  std::thread::scope(|scope| {
    for _ in 0..thread_count {
      let work_receiver = work_receiver.clone();
      let host = &host;
      let results = &results;
      scope.spawn(move || {
        while let Ok((file_path, chain)) = work_receiver.recv() {
          let outcome = process_file(environment, host, &file_path, &chain, mode);
          results.lock().push((file_path, outcome));
        }
      });
    }
  });

  let mut results = results.into_inner();
  results.sort_by(|a, b| a.0.cmp(&b.0));
  let mut changed = Vec::new();
  let mut unchanged = 0;
  let mut errors = Vec::new();
  for (file_path, outcome) in results {
    match outcome {
      FileOutcome::Changed => changed.push(file_path),
      FileOutcome::Unchanged => unchanged += 1,
      FileOutcome::Failed(error) => {
        log::warn!("{}", error);
        errors.push(error);
      }
    }
  }

  host.shutdown();
  log::debug!("Processed {} files in {}ms.", routed, start_instant.elapsed().as_millis());

  Ok(RunResult {
    mode,
    total,
    changed,
    unchanged,
    errors,
    load_errors,
  })
}

fn process_file<TEnvironment: Environment>(environment: &TEnvironment, host: &PluginHost, file_path: &Path, chain: &[usize], mode: RunMode) -> FileOutcome {
  let internal_error = |message: String| {
    FileOutcome::Failed(FileError {
      path: file_path.to_path_buf(),
      kind: FileErrorKind::Internal,
      message,
    })
  };
  let original_text = match environment.read_file(file_path) {
    Ok(text) => text,
    Err(err) => return internal_error(err.to_string()),
  };
  let formatted_text = match format_with_chain(host, file_path, &original_text, chain) {
    Ok(text) => text,
    Err(err) => return FileOutcome::Failed(err.for_path(file_path.to_path_buf())),
  };
  if formatted_text == original_text {
    return FileOutcome::Unchanged;
  }
  // formatting twice catches a plugin whose output reformats differently
  match format_with_chain(host, file_path, &formatted_text, chain) {
    Ok(second_text) if second_text != formatted_text => {
      return internal_error("Formatting was not stable. The formatted text changed when formatting it again.".to_string());
    }
    Ok(_) => {}
    Err(err) => return FileOutcome::Failed(err.for_path(file_path.to_path_buf())),
  }
  if mode == RunMode::Format {
    if let Err(err) = environment.write_file(file_path, &formatted_text) {
      return internal_error(err.to_string());
    }
  }
  FileOutcome::Changed
}

fn format_with_chain(host: &PluginHost, file_path: &Path, file_text: &str, chain: &[usize]) -> Result<String, FormatError> {
  let mut text = file_text.to_string();
  for &plugin_index in chain {
    log::debug!("Formatting {} with plugin '{}'.", file_path.display(), host.plugin_name(plugin_index));
    if let Some(new_text) = host.format_file(plugin_index, file_path, &text)? {
      text = new_text;
    }
  }
  Ok(text)
}
