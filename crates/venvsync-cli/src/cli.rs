use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

pub const VENVSYNC_BEFORE_HELP: &str = concat!(
    "venvsync ",
    env!("CARGO_PKG_VERSION"),
    " – keep the selected Python interpreter in step with pdm\n\n",
    "\x1b[1;36mEnvironments\x1b[0m\n",
    "  list             Show the pdm venvs that belong to this project.\n",
    "  current          Show the interpreter pdm recorded in .pdm-python.\n",
    "  use              Switch pdm to a named venv and select its interpreter.\n\n",
    "\x1b[1;36mSync\x1b[0m\n",
    "  sync             Push the recorded interpreter into the selection store once.\n",
    "  watch            Keep syncing whenever .pdm-python changes.\n\n",
    "\x1b[1;36mDiagnostics\x1b[0m\n",
    "  hash             Print the venv name prefix pdm uses for a project path.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "venvsync",
    author,
    version,
    disable_help_subcommand = true,
    before_help = VENVSYNC_BEFORE_HELP
)]
#[allow(clippy::struct_excessive_bools)]
pub struct VenvsyncCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)", global = true)]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        short = 'C',
        long,
        value_name = "DIR",
        help = "Project root (defaults to the nearest pdm project above the working directory)",
        global = true
    )]
    pub project: Option<PathBuf>,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(about = "List the pdm venvs created for this project.")]
    List,
    #[command(about = "Show the interpreter recorded in .pdm-python and its venv name.")]
    Current,
    #[command(
        about = "Run `pdm use --venv NAME`, then select the new interpreter.",
        override_usage = "venvsync use <NAME>"
    )]
    Use(UseArgs),
    #[command(about = "Select the interpreter recorded in .pdm-python.")]
    Sync(SyncArgs),
    #[command(about = "Watch .pdm-python and sync on every change (Ctrl-C to stop).")]
    Watch,
    #[command(about = "Print the canonical path, hash and venv prefix for a project.")]
    Hash(HashArgs),
    #[command(about = "Generate shell completion scripts.")]
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct UseArgs {
    #[arg(value_name = "NAME", help = "Short venv name as listed by `venvsync list`")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[arg(long, help = "Sync even when VENVSYNC_AUTO_SELECT is off")]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct HashArgs {
    #[arg(value_name = "PATH", help = "Absolute project path (defaults to the current project)")]
    pub path: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}
