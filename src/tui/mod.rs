//! 対話操作（キー入力と外部プログラム起動）

pub mod input;
pub mod launcher;

pub use input::{Controller, Decision, HitContext, KeyProfile, KeySource, ScriptedKeys, TerminalKeys};
pub use launcher::{Launcher, SystemLauncher};
