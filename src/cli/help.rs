//! ヘルプ出力（--config-help / --keys-help / --list-helpers）

use crate::cli::config_file::{ConfigFile, CONFIG_FILE_NAME};
use crate::searchers::code_helpers::BUILTIN_HELPERS;
use crate::tui::launcher::EDITOR_ENV;
use std::fmt::Write;

/// Usage examples appended to clap's `--help`
pub const USAGE_EXAMPLES: &str = "\
Examples:
  ts . -s needle                 literal search below the current directory
  ts src -s -o cpp,h -r 'get\\w+' regex search in C++ sources only
  ts src -s -k instr Search      `Search` inside a string literal
  ts data -b=u32 1               uint32 value 1 in 4-byte windows
  ts conf -x //server/@port      XPath query over XML documents
  ts conf -x --json servers/*/port  path query over JSON documents
  ts . -s -m --unique Size       every distinct word containing `Size`
  ts . -s -T TODO                per-file counts, highest first";

pub fn config_help() -> String {
    format!(
        "\
Custom switches are read from {CONFIG_FILE_NAME} beside the executable,
or from the file given with --config.

  default = <FLAGS>     flags applied before every invocation
  <NAME> = <REGEX>      custom helper; {{0}} is replaced by the escaped query
  <NAME> = -<FLAGS>     bundle of flags expanded in place

Use a switch as --<NAME> or -k <NAME>. A template without {{0}} needs no query.
Custom switches override built-in helpers of the same name.

Lines starting with #, // or REM directly above a switch are shown by
--list-helpers. A blank line drops pending comment lines.

Example:
  default = -l -n 9
  # Contained in an email address
  email = [\\w.]+@{{0}}
  code = -s -o cpp,h,hpp,c,cc"
    )
}

pub fn keys_help() -> String {
    format!(
        "\
At each hit:
  Y / Enter / Space   next hit
  N / Esc / Ctrl+C    quit (the report is still printed)
  S                   skip the rest of this file
  F                   skip the rest of this folder
  A                   auto mode: stop pausing for the rest of the session
  E                   open the file in the editor named by {EDITOR_ENV}
  O                   open the containing folder
  C                   copy path:line and the focus line to the clipboard

Scrolling (the hit is redrawn in place):
  Up / Down           one line
  PageUp / PageDown   one window
  Left / Right        horizontal scroll
  Ctrl + arrow        scroll by the window height (at least 5)

Binary checkpoints (every 128 windows, also in auto mode):
  Y continue, N quit, S skip file, D disable further checkpoints

Editor setup:
  {EDITOR_ENV}=code        VS Code, opened with --goto path:line
  {EDITOR_ENV}=vim         vim/nvim/vi/nano/emacs/micro/helix, opened with +line
  {EDITOR_ENV}=notepad++   Notepad++, opened with -n<line>
Other editors receive the path only."
    )
}

/// Built-in helpers followed by the custom switches from `config`
pub fn helpers_listing(config: &ConfigFile) -> String {
    let mut out = String::from("Built-in helpers (-k NAME or --NAME):\n");
    for helper in BUILTIN_HELPERS {
        let _ = writeln!(out, "  {:<8} {}", helper.name, helper.description);
        let _ = writeln!(out, "  {:<8}   {}", "", helper.template);
    }

    if config.switches.is_empty() {
        return out;
    }

    match &config.path {
        Some(path) => {
            let _ = writeln!(out, "\nCustom switches ({}):", path.display());
        }
        None => out.push_str("\nCustom switches:\n"),
    }
    for switch in &config.switches {
        for comment in &switch.comment {
            let _ = writeln!(out, "  # {comment}");
        }
        let _ = writeln!(out, "  {:<8} {}", switch.name, switch.value);
    }
    out
}
