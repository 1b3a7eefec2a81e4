//! Status and change lines for CLI commands

use super::context::UiContext;
use console::style;

/// Successful step
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        println!("  {} {}", style("[OK]").green(), message);
    }
}

/// Successful step with a dimmed detail
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(format!("{} ({})", message, style(detail).dim())).ok();
    } else {
        println!("  {} {} ({})", style("[OK]").green(), message, detail);
    }
}

/// Warning followed by what the user can do about it
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(format!("{} - {}", message, style(hint).dim())).ok();
    } else {
        println!("  {} {} - {}", style("[WARN]").yellow(), message, hint);
    }
}

pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(message).ok();
    } else {
        println!("  {} {}", style("[INFO]").cyan(), message);
    }
}

/// How one key differs between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One `namespace.key` change seen by `watch`
pub fn change(kind: ChangeKind, namespace: &str, key: &str, value: &str) {
    let name = format!("{}.{}", namespace, key);
    match kind {
        ChangeKind::Added => println!("{} {} = {}", style("+").green().bold(), name, value),
        ChangeKind::Removed => println!("{} {}", style("-").red().bold(), name),
        ChangeKind::Modified => println!("{} {} = {}", style("~").yellow().bold(), name, value),
    }
}
