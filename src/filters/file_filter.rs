use crate::config::SessionConfig;
use std::path::Path;

/// Creation-time gate for searchable files: extension lists and size limit.
#[derive(Debug, Clone)]
pub struct FileFilter {
    only_extensions: Vec<String>,
    excluded_extensions: Vec<String>,
    max_bytes: u64,
}

impl FileFilter {
    pub fn new(only_extensions: Vec<String>, excluded_extensions: Vec<String>, max_bytes: u64) -> Self {
        Self {
            only_extensions: normalize(only_extensions),
            excluded_extensions: normalize(excluded_extensions),
            max_bytes,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.only_extensions.clone(),
            config.excluded_extensions.clone(),
            config.max_bytes,
        )
    }

    /// Check if a file should be searched, given its size in bytes
    pub fn should_search_file(&self, path: &Path, size: u64) -> bool {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_lowercase());

        match &extension {
            Some(ext) => {
                if !self.only_extensions.is_empty() && !self.only_extensions.contains(ext) {
                    log::trace!("Skipping {} (extension not listed)", path.display());
                    return false;
                }
                if self.excluded_extensions.contains(ext) {
                    log::trace!("Skipping {} (extension excluded)", path.display());
                    return false;
                }
            }
            None => {
                // 拡張子なしのファイルは only リスト指定時に除外
                if !self.only_extensions.is_empty() {
                    return false;
                }
            }
        }

        if size > self.max_bytes {
            log::debug!("Skipping large file: {} ({} bytes)", path.display(), size);
            return false;
        }

        true
    }
}

/// Lower-case and strip a leading dot so `.CPP` and `cpp` are the same entry
fn normalize(extensions: Vec<String>) -> Vec<String> {
    extensions
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}
