use ignore::WalkBuilder;
use std::path::Path;

/// Configures directory walking for the item tree
pub struct GitignoreFilter {
    respect_gitignore: bool,
    recurse: bool,
}

impl GitignoreFilter {
    pub fn new(respect_gitignore: bool, recurse: bool) -> Self {
        Self {
            respect_gitignore,
            recurse,
        }
    }

    /// Create a WalkBuilder for one root directory.
    ///
    /// Entries come out depth-first and sorted by file name so the tree
    /// enumeration order is stable between runs.
    pub fn create_walker(&self, directory: &Path) -> WalkBuilder {
        let mut builder = WalkBuilder::new(directory);

        builder
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        if self.respect_gitignore {
            builder
                .git_ignore(true)
                .git_global(true)
                .git_exclude(true)
                .require_git(false)
                .parents(true)
                .ignore(true)
                .filter_entry(|entry| entry.file_name() != ".git");
        }

        if !self.recurse {
            builder.max_depth(Some(1));
        }

        builder
    }
}
