//! コマンドライン（引数、設定ファイル、ヘルプ）

pub mod cli_app;
pub mod config_file;
pub mod help;

pub use cli_app::{run_cli, Cli, Invocation};
pub use config_file::{ConfigFile, CustomSwitch};
