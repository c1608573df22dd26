//! Loading indicator and incremental printing for a pending reply

use crate::output::console::ConsoleFormatter;
use indicatif::{ProgressBar, ProgressStyle};
use multiturn_application::SessionSnapshot;
use std::io::{self, Write};
use std::time::Duration;

/// Spinner tick while waiting for the first streamed text.
const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Shows a spinner until the first text arrives, then prints the reply as
/// it streams in.
///
/// Driven by [`SessionSnapshot`]s; only the bytes not printed yet are
/// written, so snapshots may be skipped without losing text.
pub struct ReplyProgress<W: Write = io::Stdout> {
    out: W,
    label: String,
    spinner: Option<ProgressBar>,
    printed: usize,
    started: bool,
}

impl ReplyProgress<io::Stdout> {
    pub fn stdout(label: impl Into<String>, waiting_for: &str, show_spinner: bool) -> Self {
        Self::new(io::stdout(), label, waiting_for, show_spinner)
    }
}

impl<W: Write> ReplyProgress<W> {
    pub fn new(out: W, label: impl Into<String>, waiting_for: &str, show_spinner: bool) -> Self {
        let spinner = show_spinner.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.blue} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!("Waiting for {}...", waiting_for));
            pb.enable_steady_tick(TICK_INTERVAL);
            pb
        });

        Self {
            out,
            label: label.into(),
            spinner,
            printed: 0,
            started: false,
        }
    }

    /// Print whatever the snapshot's streaming reply adds.
    pub fn update(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        self.show(snapshot.streaming_text())
    }

    /// Stop the spinner and print the rest of the final reply, if any.
    ///
    /// Without a reply, text already shown is marked as discarded so the
    /// screen does not suggest it became part of the conversation.
    pub fn finish(&mut self, reply: Option<&str>) -> io::Result<()> {
        if let Some(text) = reply {
            self.show(text)?;
        }
        self.clear_spinner();
        if self.started {
            writeln!(self.out)?;
            if reply.is_none() {
                writeln!(
                    self.out,
                    "{}",
                    ConsoleFormatter::format_notice("partial reply discarded")
                )?;
            }
            self.started = false;
        }
        self.out.flush()
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn show(&mut self, text: &str) -> io::Result<()> {
        let Some(unseen) = text.get(self.printed..) else {
            return Ok(());
        };
        if unseen.is_empty() {
            return Ok(());
        }

        self.clear_spinner();
        if !self.started {
            write!(self.out, "{} ", self.label)?;
            self.started = true;
        }
        write!(self.out, "{}", unseen)?;
        self.out.flush()?;
        self.printed = text.len();
        Ok(())
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl<W: Write> Drop for ReplyProgress<W> {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}
