use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::error_handling::{explain_completion_error, ErrorType, UserFriendlyError};
use crate::extract::extract_command;
use crate::format::format_response;
use crate::history::{HistoryStore, RECENT_LISTING};
use crate::input::{classify, HistoryCommand, Input, HISTORY_USAGE};
use crate::logging::{get_logger, LogCategory, LogContext};
use crate::menu::{topic_prompt, write_menu, MenuAction, MenuKey};
use crate::providers::CompletionProvider;
use crate::{log_debug, log_info, log_warning};
use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

pub const SYSTEM_PROMPT: &str = "You are heycli, an assistant living in a terminal. Answer for a command-line user:

1. Stay under 3 lines of text.
2. Use short sentences and technical language; skip pleasantries.
3. When a command helps, put exactly one runnable command on its own line, starting with \"$ \".
4. Suggest one command per reply unless asked for more.
5. For broader topics, point the user to the menu (type 'm').";

pub const WELCOME: &str =
    "Welcome to heycli! How can I assist you today? (Type 'm' for menu, 'history' for command history)";

pub const FAREWELL: &str = "Thanks for using heycli. Goodbye!";

pub const NOTHING_TO_COPY: &str = "No command to copy. Ask for a command first!";

pub const INVALID_INDEX: &str = "Invalid history index.";

const PROMPT: &str = "heycli> ";

/// Whether the read loop keeps going after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub format_output: bool,
    pub wrap_width: usize,
    /// Animated "Thinking..." spinner on stderr while the model answers
    pub show_spinner: bool,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            format_output: config.format_output,
            wrap_width: config.wrap_width,
            show_spinner: true,
        }
    }
}

/// One interactive heycli session.
///
/// Owns the history, the last command pulled out of a reply, and the
/// injected completion and clipboard capabilities. All user-facing text goes
/// to `out`.
pub struct AssistantSession<W: Write> {
    history: HistoryStore,
    provider: Box<dyn CompletionProvider>,
    clipboard: Box<dyn Clipboard>,
    out: W,
    options: SessionOptions,
    last_command: Option<String>,
}

impl<W: Write> AssistantSession<W> {
    pub fn new(
        history: HistoryStore,
        provider: Box<dyn CompletionProvider>,
        clipboard: Box<dyn Clipboard>,
        out: W,
        options: SessionOptions,
    ) -> Self {
        Self {
            history,
            provider,
            clipboard,
            out,
            options,
            last_command: None,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Read lines from `input` until quit or end of input
    pub async fn run<R: BufRead>(&mut self, mut input: R) -> Result<()> {
        writeln!(self.out, "{}", WELCOME.bold().cyan())?;

        loop {
            write!(self.out, "\n{}", PROMPT.bold().green())?;
            self.out.flush()?;

            // invalid UTF-8 is replaced, never fatal
            let mut buf = Vec::new();
            if input.read_until(b'\n', &mut buf)? == 0 {
                writeln!(self.out)?;
                writeln!(self.out, "{}", FAREWELL)?;
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);

            if self.handle_line(&line).await? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Classify and act on one line of input
    pub async fn handle_line(&mut self, raw: &str) -> Result<Flow> {
        let input = match classify(raw) {
            Input::History(command) => match self.handle_history(command)? {
                Some(recalled) => {
                    writeln!(self.out, "{} {}", "↻".cyan(), recalled.dimmed())?;
                    classify(&recalled)
                }
                None => return Ok(Flow::Continue),
            },
            other => other,
        };

        self.dispatch(input).await
    }

    async fn dispatch(&mut self, input: Input) -> Result<Flow> {
        match input {
            Input::Empty => {}
            // only reachable through a recalled entry
            Input::History(_) => {
                writeln!(self.out, "A history command cannot be recalled from history.")?;
            }
            Input::Menu(key) => return self.run_menu(key).await,
            Input::Copy => self.copy_last_command()?,
            Input::Query(text) => self.run_query(&text).await?,
        }
        Ok(Flow::Continue)
    }

    /// Returns the entry text when the command recalls one
    fn handle_history(&mut self, command: HistoryCommand) -> Result<Option<String>> {
        match command {
            HistoryCommand::List => {
                let recent = self.history.recent(RECENT_LISTING);
                if recent.is_empty() {
                    writeln!(self.out, "History is empty.")?;
                }
                for (index, entry) in recent {
                    writeln!(self.out, "{}: {}", index.to_string().cyan(), entry)?;
                }
            }
            HistoryCommand::Search(term) => {
                let matches = self.history.search_indexed(&term);
                if matches.is_empty() {
                    writeln!(self.out, "No history entries match '{}'.", term)?;
                }
                for (index, entry) in matches {
                    writeln!(self.out, "{}: {}", index.to_string().cyan(), entry)?;
                }
            }
            HistoryCommand::Recall(index) => {
                let entry = i64::try_from(index)
                    .ok()
                    .and_then(|i| self.history.get(i))
                    .map(str::to_string);
                if entry.is_none() {
                    writeln!(self.out, "{}", INVALID_INDEX.red())?;
                }
                return Ok(entry);
            }
            HistoryCommand::InvalidIndex => {
                writeln!(self.out, "{}", INVALID_INDEX.red())?;
            }
            HistoryCommand::Usage => {
                writeln!(self.out, "{}", HISTORY_USAGE.yellow())?;
            }
        }
        Ok(None)
    }

    /// Menu handling for raw text, reporting keys that are not in the menu
    #[cfg(test)]
    async fn select_menu(&mut self, raw: &str) -> Result<Flow> {
        match MenuKey::parse(raw.trim()) {
            Some(key) => self.run_menu(key).await,
            None => {
                writeln!(self.out, "{}", crate::menu::INVALID_OPTION_MESSAGE.yellow())?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn run_menu(&mut self, key: MenuKey) -> Result<Flow> {
        match key.action() {
            MenuAction::ShowMenu => write_menu(&mut self.out)?,
            MenuAction::Quit => {
                writeln!(self.out, "{}", FAREWELL)?;
                log_info!(LogCategory::System, "Session ended by user");
                return Ok(Flow::Exit);
            }
            MenuAction::Topic(label) => {
                self.ask(&topic_prompt(label)).await?;
            }
        }
        Ok(Flow::Continue)
    }

    fn copy_last_command(&mut self) -> Result<()> {
        let Some(command) = self.last_command.clone() else {
            writeln!(self.out, "{}", NOTHING_TO_COPY.yellow())?;
            return Ok(());
        };

        match self.clipboard.copy(&command) {
            Ok(()) => {
                writeln!(self.out, "{} Copied to clipboard: {}", "📋".green(), command.green())?;
                log_info!(
                    LogCategory::Clipboard,
                    "Copied last command",
                    LogContext::new().with_component("clipboard").with_success(true)
                );
            }
            Err(e) => {
                log_warning!(LogCategory::Clipboard, format!("Clipboard write failed: {}", e));
                UserFriendlyError::new(ErrorType::Clipboard, "Could not copy to the clipboard".to_string())
                    .with_suggestion(format!("Copy the command by hand: {}", command))
                    .with_technical_details(e.to_string())
                    .write_to(&mut self.out)?;
            }
        }
        Ok(())
    }

    async fn run_query(&mut self, text: &str) -> Result<()> {
        if let Err(e) = self.history.add(text) {
            log_warning!(LogCategory::History, format!("Failed to persist history: {}", e));
            writeln!(self.out, "{} Could not save history: {}", "⚠️".yellow(), e)?;
        }

        if let Some(reply) = self.ask(text).await? {
            if let Some(command) = extract_command(&reply) {
                writeln!(self.out, "{}", "💡 Type 'cp' to copy the command.".dimmed())?;
                self.last_command = Some(command);
            }
        }
        Ok(())
    }

    /// Send one prompt and print the reply. Failures are reported, not returned.
    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        let spinner = if self.options.show_spinner {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈")
                    .template("{spinner:.cyan} {msg}")?,
            );
            pb.set_message("Thinking...");
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        let started = Instant::now();
        let result = self.provider.complete(SYSTEM_PROMPT, prompt).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if let Ok(logger) = get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let error_code = result.as_ref().err().map(|e| e.code());
                let _ = logger_guard.log_provider_call(self.provider.name(), elapsed_ms, error_code);
            }
        }

        match result {
            Ok(reply) => {
                log_debug!(
                    LogCategory::Provider,
                    format!("Reply received: {} lines", reply.lines().count())
                );
                self.print_reply(&reply)?;
                Ok(Some(reply))
            }
            Err(e) => {
                explain_completion_error(&e).write_to(&mut self.out)?;
                Ok(None)
            }
        }
    }

    fn print_reply(&mut self, reply: &str) -> Result<()> {
        let text = if self.options.format_output {
            format_response(reply, self.options.wrap_width)
        } else {
            reply.trim_end().to_string()
        };

        for line in text.lines() {
            if line.trim_start().starts_with('$') {
                writeln!(self.out, "{}", line.bold().green())?;
            } else {
                writeln!(self.out, "{}", line)?;
            }
        }
        Ok(())
    }
}
