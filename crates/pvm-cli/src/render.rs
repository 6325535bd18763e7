use std::io::IsTerminal;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use pvm_core::PvmError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct TerminalProgress {
    style: OutputStyle,
    label: String,
    total: Option<u64>,
    current: u64,
    progress_bar: Option<ProgressBar>,
    started_at: Instant,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    pub(crate) fn start_download(self, label: &str) -> TerminalProgress {
        let progress_bar = if self.style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<12} {bytes:>10} {binary_bytes_per_sec:>12} {elapsed_precise}",
            ) {
                progress_bar.set_style(style.tick_chars(".oO@* "));
            }
            progress_bar.set_message(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        TerminalProgress {
            style: self.style,
            label: label.to_string(),
            total: None,
            current: 0,
            progress_bar,
            started_at: Instant::now(),
        }
    }
}

impl TerminalProgress {
    pub(crate) fn set(&mut self, current: u64, total: Option<u64>) {
        self.current = current;

        let Some(progress_bar) = &self.progress_bar else {
            self.total = total;
            return;
        };

        if total.is_some() && self.total.is_none() {
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<12} [{bar:20.cyan/blue}] {bytes:>10}/{total_bytes:10} {eta}",
            ) {
                progress_bar.set_style(style.tick_chars(".oO@* ").progress_chars("=>-"));
            }
        }
        self.total = total;
        if let Some(total) = total {
            progress_bar.set_length(total.max(1));
        }
        progress_bar.set_position(current);
    }

    pub(crate) fn finish_success(mut self) {
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };

        progress_bar.finish_and_clear();
        if let Some(line) = render_progress_line(
            self.style,
            &self.label,
            self.current,
            self.total,
            Some(self.started_at.elapsed()),
        ) {
            println!("{line}");
        }
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    resolve_output_style(
        std::io::stdout().is_terminal(),
        std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty()),
    )
}

pub(crate) fn resolve_output_style(stdout_is_tty: bool, no_color: bool) -> OutputStyle {
    if stdout_is_tty && !no_color {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

/// One console line led by a `[Tag]` badge. Unrecognized statuses print bare.
pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    let Some((tag, color)) = status_badge(status) else {
        return message.to_string();
    };
    let badge = format!("[{tag}]");
    match style {
        OutputStyle::Plain => format!("{badge} {message}"),
        OutputStyle::Rich => format!("{} {message}", colorize(badge_style(color), &badge)),
    }
}

/// Formats a failure for the exit boundary.
///
/// Typed errors pick their badge from the failure kind; the cause chain
/// follows on indented lines.
pub(crate) fn render_error_lines(style: OutputStyle, err: &anyhow::Error) -> Vec<String> {
    let status = match err.downcast_ref::<PvmError>() {
        Some(pvm_err) => {
            tracing::debug!(kind = ?pvm_err.kind(), "command failed");
            if pvm_err.is_warning() {
                "warning"
            } else {
                "error"
            }
        }
        None => "error",
    };
    let mut lines = vec![render_status_line(style, status, &err.to_string())];
    lines.extend(err.chain().skip(1).map(|cause| format!("  caused by: {cause}")));
    lines
}

fn status_badge(status: &str) -> Option<(&'static str, AnsiColor)> {
    match status {
        "error" => Some(("Error", AnsiColor::Red)),
        "warning" => Some(("Warning", AnsiColor::Yellow)),
        "success" => Some(("Success", AnsiColor::Green)),
        "info" => Some(("Info", AnsiColor::Cyan)),
        _ => None,
    }
}

fn badge_style(color: AnsiColor) -> Style {
    Style::new()
        .fg_color(Some(color.into()))
        .effects(Effects::BOLD)
}

fn progress_label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn progress_bar_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightBlue.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

pub(crate) fn render_progress_line(
    style: OutputStyle,
    label: &str,
    current: u64,
    total: Option<u64>,
    elapsed: Option<Duration>,
) -> Option<String> {
    if style == OutputStyle::Plain {
        return None;
    }

    let width = 18_u64;
    let safe_total = total.unwrap_or(current).max(1);
    let bounded_current = current.min(safe_total);
    let filled = (bounded_current * width / safe_total) as usize;
    let bar = format!(
        "{}{}",
        "=".repeat(filled),
        "-".repeat((width as usize).saturating_sub(filled))
    );
    let percent = bounded_current * 100 / safe_total;
    let counts = match total {
        Some(total) => format!("{}/{}", HumanBytes(current), HumanBytes(total)),
        None => HumanBytes(current).to_string(),
    };
    let suffix = elapsed
        .map(|value| format!(" complete in {}", format_elapsed(value)))
        .unwrap_or_default();

    Some(format!(
        "{} [{}] {:>3}% {}{}",
        colorize(progress_label_style(), label),
        colorize(progress_bar_style(), &bar),
        percent,
        counts,
        suffix
    ))
}
