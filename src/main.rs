//! ts - interactive terminal content search
//!
//! Command-line usage:
//!   ts [ROOT...] QUERY            - Literal search
//!   ts [ROOT...] -r PATTERN       - Regex search
//!   ts [ROOT...] -k HELPER QUERY  - Code helper search
//!   ts [ROOT...] -b[=KIND] VALUE  - Binary search
//!   ts [ROOT...] -x XPATH         - XPath query over XML
//!   ts [ROOT...] -x --json PATH   - Path query over JSON

use ts::cli::run_cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run_cli()
}
