//! Terminal detection for choosing fancy or plain output

use std::io::IsTerminal;

const CI_VARS: [&str; 6] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// Decides how progress and change lines are rendered
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
}

impl UiContext {
    /// Inspect stderr and the environment
    pub fn detect() -> Self {
        let interactive =
            std::io::stderr().is_terminal() && !CI_VARS.iter().any(|v| std::env::var_os(v).is_some());
        Self { interactive }
    }

    /// Plain output regardless of the terminal
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}
