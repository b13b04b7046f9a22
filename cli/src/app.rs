//! Application context: unified state passed to every command handler.
//!
//! `AppContext` bundles the output context, resolved settings, and the
//! concrete infrastructure adapters so command handlers take a single
//! `&AppContext` instead of loose parameters.

use anyhow::Result;

use crate::domain::config::InstallerSettings;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::load_settings;
use crate::infra::fs::StdFs;
use crate::infra::host::SystemHost;
use crate::infra::network::TokioNetworkProbe;
use crate::infra::state::StateManager;
use crate::output::{HumanRenderer, OutputContext};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
    /// Show raw tool output attached to errors.
    pub verbose: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `SEED_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Base path, package source and launcher directory.
    pub settings: InstallerSettings,
    /// Installation state persisted under the base path.
    pub store: StateManager,
    /// Child process runner.
    pub runner: TokioCommandRunner,
    /// Host facts (os-release, PATH lookups, TTY).
    pub host: SystemHost,
    /// TCP reachability checks.
    pub network: TokioNetworkProbe,
    /// Filesystem adapter.
    pub fs: StdFs,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `SEED_YES`
    /// environment variables are present.
    pub non_interactive: bool,
    /// Whether `--verbose` was passed.
    pub verbose: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the `SEED_*` environment is invalid or the home
    /// directory cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("SEED_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON documents own stdout; progress lines would corrupt them.
        let quiet = flags.output.quiet || flags.output.json;

        let settings = load_settings()?;
        let store = StateManager::with_path(settings.layout.state_file());

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            settings,
            store,
            runner: TokioCommandRunner::default(),
            host: SystemHost,
            network: TokioNetworkProbe,
            fs: StdFs,
            non_interactive,
            verbose: flags.output.verbose,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Human renderer over this context's output settings.
    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `SEED_YES` env),
    /// returns `true` immediately without prompting: passing `--yes` is the
    /// user's answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(true);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
