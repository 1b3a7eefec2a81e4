//! Terminal output for the CLI
//!
//! Uses `cliclack` on an interactive terminal and falls back to plain
//! `[OK]`/`[WARN]` lines in CI or when output is piped.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{change, step_info, step_ok, step_ok_detail, step_warn_hint, ChangeKind};
pub use progress::TaskSpinner;
