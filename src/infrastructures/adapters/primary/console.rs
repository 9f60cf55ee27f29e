use crate::application::use_cases::dispatch_forks::DispatchOutcome;
use crate::application::use_cases::fork_organizations::ForkProgress;
use clap::ValueEnum;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Green,
    Yellow,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "\x1b[1m",
            Style::Green => "\x1b[32m",
            Style::Yellow => "\x1b[93m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Wraps `text` in the ANSI sequence of `style` when `enabled`.
pub fn paint(enabled: bool, style: Style, text: &str) -> String {
    if enabled {
        format!("{}{text}{RESET}", style.code())
    } else {
        text.to_string()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// `NO_COLOR` wins over everything; `auto` follows whether the output is a terminal.
    pub fn enabled(self, no_color: bool, is_tty: bool) -> bool {
        if no_color {
            return false;
        }
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => is_tty,
        }
    }
}

/// Human readable transcript of a run, written as progress arrives.
pub struct ConsoleTranscript<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> ConsoleTranscript<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        let written = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::debug!("Failed to write progress: {}", e);
        }
    }

    fn heading(&self, text: &str) -> String {
        paint(self.color, Style::Bold, text)
    }

    fn dot(&self) -> String {
        paint(self.color, Style::Yellow, ".")
    }
}

impl<W: Write> ForkProgress for ConsoleTranscript<W> {
    fn organization_started(&mut self, org: &str) {
        let text = format!("{}\n\n", self.heading(&format!("# {org}")));
        self.emit(&text);
    }

    fn listing_started(&mut self) {
        let text = self.heading("Processing");
        self.emit(&text);
    }

    fn page_fetched(&mut self, _repositories: usize) {
        let text = self.dot();
        self.emit(&text);
    }

    fn listing_finished(&mut self, _total: usize) {
        self.emit("\n\n");
    }

    fn forking_started(&mut self) {
        let text = format!("{}\n\n", self.heading("## Forking"));
        self.emit(&text);
    }

    fn fork_dispatched(&mut self, fork_url: &str, source_url: &str) {
        let text = format!("  {:<70} -> {}\n", format!(" {fork_url}"), source_url);
        self.emit(&text);
    }

    fn dispatch_finished(&mut self) {
        let text = format!("\n{}", self.heading("Processing"));
        self.emit(&text);
    }

    fn fork_completed(&mut self) {
        let text = self.dot();
        self.emit(&text);
    }

    fn organization_finished(&mut self, outcome: DispatchOutcome) {
        let text = match outcome {
            DispatchOutcome::Completed { .. } => "\n\n".to_string(),
            DispatchOutcome::UpToDate => format!(
                ".\n{}\n\n",
                paint(self.color, Style::Green, "Already up-to-date.")
            ),
        };
        self.emit(&text);
    }
}
