use std::io;
use std::sync::Arc;

use atty::Stream;
use clap::{CommandFactory, Parser};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use venvsync_core::{
    CommandContext, CommandStatus, Config, ExecutionOutcome, GlobalOptions, LogNotifier,
    Notifier, SystemEffects,
};

mod cli;
mod dispatch;
mod style;

use cli::{CommandGroupCli, VenvsyncCli};
use style::{ConsoleNotifier, Style};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = VenvsyncCli::parse();
    init_tracing(cli.trace, cli.verbose);

    if let CommandGroupCli::Completions(args) = &cli.command {
        let mut command = VenvsyncCli::command();
        clap_complete::generate(args.shell, &mut command, "venvsync", &mut io::stdout());
        return Ok(());
    }

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        project: cli
            .project
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
    };

    let outcome = match Config::from_env() {
        Ok(config) => {
            let stderr_style = Style::new(cli.no_color, atty::is(Stream::Stderr));
            let notifier: Arc<dyn Notifier> = if cli.json {
                Arc::new(LogNotifier)
            } else {
                let echo_errors = matches!(cli.command, CommandGroupCli::Watch);
                Arc::new(ConsoleNotifier::new(stderr_style, cli.quiet, echo_errors))
            };
            let effects = Arc::new(SystemEffects::new(&config, notifier));
            let ctx = CommandContext::new(&global, config, effects);
            dispatch::dispatch_command(&ctx, &cli.command)?
        }
        Err(err) => ExecutionOutcome::user_error(
            format!("{err:#}"),
            serde_json::json!({
                "reason": "invalid_configuration",
                "hint": "check the VENVSYNC_* environment variables",
            }),
        ),
    };
    let code = emit_output(&cli, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("venvsync={level},venvsync_core={level},venvsync_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn emit_output(cli: &VenvsyncCli, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.exit_code();
    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    if cli.json {
        let payload = serde_json::to_string_pretty(&outcome.to_json())
            .map_err(|err| eyre!("failed to encode output: {err}"))?;
        println!("{payload}");
    } else if !cli.quiet || outcome.status != CommandStatus::Ok {
        let line = style.status(&outcome.status, &outcome.message);
        if outcome.status == CommandStatus::Ok {
            println!("{line}");
        } else {
            eprintln!("{line}");
        }
        if let Some(hint) = hint_from_details(&outcome.details) {
            let hint_line = format!("Hint: {hint}");
            if outcome.status == CommandStatus::Ok {
                println!("{}", style.info(&hint_line));
            } else {
                eprintln!("{}", style.info(&hint_line));
            }
        }
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}
