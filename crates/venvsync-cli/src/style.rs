use std::env;

use color_eyre::owo_colors::OwoColorize;
use venvsync_core::{CommandStatus, Notifier};

#[derive(Clone, Copy)]
pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(force_no_color: bool, is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !(force_no_color || env_no_color) && is_tty,
        }
    }

    pub fn status(&self, status: &CommandStatus, text: &str) -> String {
        let (symbol, tone) = match status {
            CommandStatus::Ok => ("✔", Tone::Green),
            CommandStatus::UserError => ("✗", Tone::Yellow),
            CommandStatus::Failure => ("✖", Tone::Red),
        };
        let line = format!("{symbol} {text}");
        self.paint(&line, tone, true)
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, Tone::Blue, false)
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, Tone::Red, false)
    }

    fn paint(&self, text: &str, tone: Tone, bold: bool) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let colored = match tone {
            Tone::Green => text.green().to_string(),
            Tone::Yellow => text.yellow().to_string(),
            Tone::Red => text.red().to_string(),
            Tone::Blue => text.cyan().to_string(),
        };
        if bold {
            colored.bold().to_string()
        } else {
            colored
        }
    }
}

enum Tone {
    Green,
    Yellow,
    Red,
    Blue,
}

/// Prints sync notifications on stderr, keeping stdout for command output.
///
/// Errors are echoed only with `echo_errors` (set for `watch`); one-shot
/// commands print them in their outcome line.
pub struct ConsoleNotifier {
    style: Style,
    quiet: bool,
    echo_errors: bool,
}

impl ConsoleNotifier {
    pub fn new(style: Style, quiet: bool, echo_errors: bool) -> Self {
        Self {
            style,
            quiet,
            echo_errors,
        }
    }

    fn error_line(&self, message: &str) -> Option<String> {
        self.echo_errors
            .then(|| self.style.error(&format!("venvsync ▸ {message}")))
    }
}

impl Notifier for ConsoleNotifier {
    fn info(&self, message: &str) {
        tracing::debug!("notify: {message}");
        if !self.quiet {
            eprintln!("{}", self.style.info(&format!("venvsync ▸ {message}")));
        }
    }

    fn error(&self, message: &str) {
        tracing::debug!("notify error: {message}");
        if let Some(line) = self.error_line(message) {
            eprintln!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_style_is_plain_text() {
        let style = Style::new(true, true);
        assert_eq!(style.status(&CommandStatus::Ok, "done"), "✔ done");
        assert_eq!(style.status(&CommandStatus::Failure, "boom"), "✖ boom");
        assert_eq!(style.info("hint"), "hint");
    }

    #[test]
    fn errors_are_echoed_only_when_asked() {
        let style = Style::new(true, false);
        let oneshot = ConsoleNotifier::new(style, false, false);
        assert_eq!(oneshot.error_line("pdm use --venv dev failed"), None);

        let watching = ConsoleNotifier::new(style, true, true);
        assert_eq!(
            watching.error_line("pdm use --venv dev failed").as_deref(),
            Some("venvsync ▸ pdm use --venv dev failed")
        );
    }
}
