//! Which files are eligible for ingestion.

use cockpit_config::IngestConfig;
use std::collections::HashSet;
use std::path::Path;

/// Extension, exclusion and size rules applied while walking a tree.
#[derive(Debug, Clone)]
pub struct IngestPolicy {
    /// Lowercase, with leading dot (`.rs`).
    allowed_extensions: HashSet<String>,
    exclude_dirs: HashSet<String>,
    exclude_files: HashSet<String>,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl From<&IngestConfig> for IngestPolicy {
    fn from(config: &IngestConfig) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            exclude_dirs: config.exclude_dirs.iter().cloned().collect(),
            exclude_files: config.exclude_files.iter().cloned().collect(),
            max_file_size: config.max_file_size,
            max_files: config.max_files,
        }
    }
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') { ext } else { format!(".{ext}") }
}

impl IngestPolicy {
    /// Directory names pruned from the walk.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.contains(name)
    }

    /// Name and extension check. Size is checked separately because an
    /// oversized file is reported, not silently skipped.
    pub fn accepts_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if self.exclude_files.contains(name) {
            return false;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.allowed_extensions.contains(&format!(".{}", ext.to_lowercase())),
            None => false,
        }
    }

    /// `max_file_size` in whole megabytes, for messages.
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size / (1024 * 1024)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        let home = cockpit_config::dirs_home();
        return path.replacen('~', &home.to_string_lossy(), 1);
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_accepts_source_files() {
        let policy = IngestPolicy::default();
        assert!(policy.accepts_file(Path::new("src/main.rs")));
        assert!(policy.accepts_file(Path::new("README.MD")));
        assert!(policy.accepts_file(Path::new("app.Dockerfile")));
        assert!(!policy.accepts_file(Path::new("image.png")));
        assert!(!policy.accepts_file(Path::new("Makefile")));
    }

    #[test]
    fn excluded_names_are_rejected() {
        let policy = IngestPolicy::default();
        assert!(!policy.accepts_file(Path::new("/home/me/.ssh/id_rsa")));
        assert!(!policy.accepts_file(Path::new("deploy/secrets.yaml")));
        assert!(policy.is_excluded_dir("node_modules"));
        assert!(!policy.is_excluded_dir("src"));
    }

    #[test]
    fn extensions_without_dot_are_normalized() {
        let config = IngestConfig {
            allowed_extensions: vec!["RS".into(), ".Py".into()],
            ..IngestConfig::default()
        };
        let policy = IngestPolicy::from(&config);
        assert!(policy.accepts_file(Path::new("lib.rs")));
        assert!(policy.accepts_file(Path::new("tool.py")));
        assert!(!policy.accepts_file(Path::new("notes.md")));
    }

    #[test]
    fn default_size_limit_is_five_megabytes() {
        assert_eq!(IngestPolicy::default().max_file_size_mb(), 5);
    }

    #[test]
    fn tilde_expansion() {
        let expanded = expand_tilde("~/projects");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/projects"));
        assert_eq!(expand_tilde("/abs/path"), "/abs/path");
        assert_eq!(expand_tilde("a~b"), "a~b");
    }
}
