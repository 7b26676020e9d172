pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod filters;
pub mod searchers;
pub mod session;
pub mod tree;
pub mod tui;

// 公開API
pub use config::{BinaryKind, Listing, QueryLanguage, SearchMode, SessionConfig, TellSource};
pub use error::{TsError, TsResult};
pub use searchers::Strategy;
pub use session::{run, Session, SessionCounters, SessionReport};
pub use tree::{ItemTree, SearchableDocument};
