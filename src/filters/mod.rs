//! ファイル列挙時のフィルタ

pub mod file_filter;
pub mod gitignore_filter;

pub use file_filter::FileFilter;
pub use gitignore_filter::GitignoreFilter;
