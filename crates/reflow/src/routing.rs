use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Result;
use ignore::overrides::Override;
use ignore::overrides::OverrideBuilder;
use ignore::Match;
use reflow_core::plugins::PluginDescriptor;

/// Matches paths against include and exclude glob patterns. An exclude
/// match always wins over an include match.
pub struct GlobMatcher {
  overrides: Override,
}

impl GlobMatcher {
  pub fn new(includes: &[String], excludes: &[String]) -> Result<GlobMatcher> {
    let mut builder = OverrideBuilder::new("/");
    for pattern in includes {
      builder.add(&process_pattern(pattern))?;
    }
    // added after the includes so an exclude match wins
    for pattern in excludes {
      let pattern = process_pattern(pattern);
      builder.add(&format!("!{}", pattern))?;
      // also exclude everything under a directory pattern
      if !pattern.ends_with("**") {
        builder.add(&format!("!{}/**", pattern))?;
      }
    }
    Ok(GlobMatcher {
      overrides: builder.build()?,
    })
  }

  pub fn matches(&self, path: &Path) -> bool {
    let path = if path.is_absolute() {
      path.to_path_buf()
    } else {
      PathBuf::from("/").join(path)
    };
    matches!(self.overrides.matched(&path, false), Match::Whitelist(_))
  }
}

fn process_pattern(pattern: &str) -> String {
  let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
  // a pattern without a slash matches at any depth
  if pattern.contains('/') {
    pattern.to_string()
  } else {
    format!("**/{}", pattern)
  }
}

/// Decides which plugins format which files.
///
/// An exact file name association wins over a file extension one, and
/// a more specific extension (ex. "d.ts") wins over a shorter one.
/// Remaining ties go to the plugin declared first. The returned route is
/// the full formatting chain for the file, the matched plugin first and
/// then any plugins that handle embedded content kinds it emits.
pub struct FileRouter {
  matcher: GlobMatcher,
  file_name_plugins: HashMap<String, usize>,
  extension_plugins: Vec<(String, usize)>,
  chains: Vec<Vec<usize>>,
}

impl FileRouter {
  pub fn new(descriptors: &[&PluginDescriptor], matcher: GlobMatcher) -> FileRouter {
    let mut file_name_plugins = HashMap::new();
    let mut extension_plugins = Vec::new();
    for (index, descriptor) in descriptors.iter().enumerate() {
      for file_name in &descriptor.info.file_names {
        file_name_plugins.entry(file_name.to_lowercase()).or_insert(index);
      }
      for extension in &descriptor.info.file_extensions {
        extension_plugins.push((extension.to_lowercase(), index));
      }
    }
    let chains = descriptors
      .iter()
      .enumerate()
      .map(|(index, descriptor)| {
        let mut chain = vec![index];
        for kind in &descriptor.embedded.emits {
          let handler = descriptors
            .iter()
            .enumerate()
            .find(|(other_index, other)| *other_index != index && other.embedded.handles.contains(kind));
          if let Some((handler_index, _)) = handler {
            if !chain.contains(&handler_index) {
              chain.push(handler_index);
            }
          }
        }
        chain
      })
      .collect();
    FileRouter {
      matcher,
      file_name_plugins,
      extension_plugins,
      chains,
    }
  }

  /// The plugin indices that should format the file, in order. Empty
  /// when no plugin claims the file or the path is excluded.
  pub fn route(&self, path: &Path) -> Vec<usize> {
    if !self.matcher.matches(path) {
      return Vec::new();
    }
    let file_name = match path.file_name() {
      Some(file_name) => file_name.to_string_lossy().to_lowercase(),
      None => return Vec::new(),
    };
    if let Some(&index) = self.file_name_plugins.get(&file_name) {
      return self.chains[index].clone();
    }
    let mut best: Option<(&str, usize)> = None;
    for (extension, index) in &self.extension_plugins {
      if file_name.len() > extension.len() && file_name.ends_with(extension) && file_name.as_bytes()[file_name.len() - extension.len() - 1] == b'.' {
        let is_better = match best {
          Some((best_extension, _)) => extension.len() > best_extension.len(),
          None => true,
        };
        if is_better {
          best = Some((extension, *index));
        }
      }
    }
    match best {
      Some((_, index)) => self.chains[index].clone(),
      None => Vec::new(),
    }
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;
  use reflow_core::plugins::EmbeddedRegions;
  use reflow_core::plugins::PluginInfo;

  use super::*;

  fn descriptor(name: &str, extensions: &[&str], file_names: &[&str], embedded: EmbeddedRegions) -> PluginDescriptor {
    PluginDescriptor {
      info: PluginInfo {
        name: name.to_string(),
        version: "0.1.0".to_string(),
        config_key: name.to_string(),
        file_extensions: extensions.iter().map(|text| text.to_string()).collect(),
        file_names: file_names.iter().map(|text| text.to_string()).collect(),
      },
      options: Vec::new(),
      embedded,
    }
  }

  fn match_all() -> GlobMatcher {
    GlobMatcher::new(&["**/*".to_string()], &[]).unwrap()
  }

  #[test]
  fn glob_matcher_applies_excludes_over_includes() {
    let matcher = GlobMatcher::new(&["**/*.txt".to_string()], &["target".to_string()]).unwrap();
    assert!(matcher.matches(Path::new("/dir/file.txt")));
    assert!(!matcher.matches(Path::new("/dir/file.md")));
    assert!(!matcher.matches(Path::new("/target/file.txt")));
    assert!(matcher.matches(Path::new("relative/file.txt")));
  }

  #[test]
  fn file_name_wins_over_extension() {
    let descriptors = vec![
      descriptor("by-ext", &["mk"], &[], EmbeddedRegions::default()),
      descriptor("by-name", &[], &["Makefile.mk"], EmbeddedRegions::default()),
    ];
    let router = FileRouter::new(&descriptors.iter().collect::<Vec<_>>(), match_all());
    assert_eq!(router.route(Path::new("/dir/Makefile.mk")), vec![1]);
    assert_eq!(router.route(Path::new("/dir/makefile.mk")), vec![1]);
    assert_eq!(router.route(Path::new("/dir/other.mk")), vec![0]);
  }

  #[test]
  fn most_specific_extension_wins() {
    let descriptors = vec![
      descriptor("short", &["ts"], &[], EmbeddedRegions::default()),
      descriptor("long", &["d.ts"], &[], EmbeddedRegions::default()),
    ];
    let router = FileRouter::new(&descriptors.iter().collect::<Vec<_>>(), match_all());
    assert_eq!(router.route(Path::new("/dir/types.d.ts")), vec![1]);
    assert_eq!(router.route(Path::new("/dir/main.ts")), vec![0]);
  }

  #[test]
  fn declaration_order_breaks_ties() {
    let descriptors = vec![
      descriptor("first", &["txt"], &[], EmbeddedRegions::default()),
      descriptor("second", &["txt"], &[], EmbeddedRegions::default()),
    ];
    let router = FileRouter::new(&descriptors.iter().collect::<Vec<_>>(), match_all());
    assert_eq!(router.route(Path::new("/dir/file.txt")), vec![0]);
  }

  #[test]
  fn unclaimed_or_excluded_files_get_no_route() {
    let descriptors = vec![descriptor("txt", &["txt"], &[], EmbeddedRegions::default())];
    let matcher = GlobMatcher::new(&["**/*".to_string()], &["skipped".to_string()]).unwrap();
    let router = FileRouter::new(&descriptors.iter().collect::<Vec<_>>(), matcher);
    assert_eq!(router.route(Path::new("/dir/file.unknown")), Vec::<usize>::new());
    assert_eq!(router.route(Path::new("/skipped/file.txt")), Vec::<usize>::new());
  }

  #[test]
  fn embedded_kinds_extend_the_chain() {
    let descriptors = vec![
      descriptor(
        "markdown",
        &["md"],
        &[],
        EmbeddedRegions {
          emits: vec!["code-block".to_string()],
          handles: Vec::new(),
        },
      ),
      descriptor(
        "code",
        &["code"],
        &[],
        EmbeddedRegions {
          emits: Vec::new(),
          handles: vec!["code-block".to_string()],
        },
      ),
    ];
    let router = FileRouter::new(&descriptors.iter().collect::<Vec<_>>(), match_all());
    assert_eq!(router.route(Path::new("/dir/readme.md")), vec![0, 1]);
    assert_eq!(router.route(Path::new("/dir/snippet.code")), vec![1]);
  }
}
