use crate::history::HistoryError;
use crate::logging::{get_logger, LogCategory, LogContext};
use crate::providers::CompletionError;
use colored::*;
use std::fmt;
use std::io::{self, Write};

/// An error rendered for a person at a terminal, with next steps
#[derive(Debug, Clone)]
pub struct UserFriendlyError {
    pub error_type: ErrorType,
    pub message: String,
    pub suggestions: Vec<String>,
    pub technical_details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorType {
    Connection,
    Configuration,
    Authentication,
    Quota,
    Provider,
    History,
    Clipboard,
    Timeout,
    General,
}

impl ErrorType {
    fn icon(self) -> &'static str {
        match self {
            ErrorType::Connection => "🔌",
            ErrorType::Configuration => "⚙️",
            ErrorType::Authentication => "🔐",
            ErrorType::Quota => "⏳",
            ErrorType::Provider => "🤖",
            ErrorType::History => "📜",
            ErrorType::Clipboard => "📋",
            ErrorType::Timeout => "⏱️",
            ErrorType::General => "❌",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ErrorType::Connection => "Connection Error",
            ErrorType::Configuration => "Configuration Error",
            ErrorType::Authentication => "Authentication Error",
            ErrorType::Quota => "Quota Exceeded",
            ErrorType::Provider => "AI Provider Error",
            ErrorType::History => "History Error",
            ErrorType::Clipboard => "Clipboard Error",
            ErrorType::Timeout => "Timeout Error",
            ErrorType::General => "Error",
        }
    }
}

impl UserFriendlyError {
    pub fn new(error_type: ErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            suggestions: Vec::new(),
            technical_details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions.extend(suggestions);
        self
    }

    pub fn with_technical_details(mut self, details: String) -> Self {
        self.technical_details = Some(details);
        self
    }

    /// Log the error and print it to stderr
    pub fn display(&self) {
        let _ = self.write_to(&mut io::stderr());
    }

    /// Log the error and render it, with suggestions, into `out`
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let Ok(logger) = get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let context = LogContext::new()
                    .with_component("error_handling")
                    .with_operation("display_error")
                    .with_error_code(&format!("{:?}", self.error_type))
                    .with_success(false);
                let _ = logger_guard.log_error(
                    LogCategory::System,
                    format!("{:?}: {}", self.error_type, self.message),
                    Some(context),
                );
            }
        }

        writeln!(
            out,
            "{} {}: {}",
            self.error_type.icon(),
            self.error_type.title().bold().red(),
            self.message
        )?;

        if !self.suggestions.is_empty() {
            writeln!(out)?;
            writeln!(out, "{} {}", "💡".cyan(), "Suggested solutions:".bold().yellow())?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(out, "  {}. {}", (i + 1).to_string().green(), suggestion)?;
            }
        }

        if let Some(details) = &self.technical_details {
            writeln!(out)?;
            writeln!(out, "{} {}", "🔧".dimmed(), "Technical details:".dimmed())?;
            writeln!(out, "   {}", details.dimmed())?;
        }

        Ok(())
    }
}

impl fmt::Display for UserFriendlyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UserFriendlyError {}

/// Turn a failed completion call into something actionable
pub fn explain_completion_error(error: &CompletionError) -> UserFriendlyError {
    let friendly = match error {
        CompletionError::Transient(_) => UserFriendlyError::new(
            ErrorType::Connection,
            "The AI provider could not be reached or did not answer in time".to_string(),
        )
        .with_suggestions(vec![
            "Try the question again in a moment".to_string(),
            "Check your internet connection".to_string(),
            "For a local model, make sure Ollama is running: ollama serve".to_string(),
        ]),
        CompletionError::Auth(_) => UserFriendlyError::new(
            ErrorType::Authentication,
            "The AI provider rejected the credentials".to_string(),
        )
        .with_suggestions(vec![
            "Set OPENAI_API_KEY in your environment or in a .env file".to_string(),
            "Or store the key in the OS keyring: heycli set-key <key>".to_string(),
            "Check that the key has not been revoked".to_string(),
        ]),
        CompletionError::Quota(_) => UserFriendlyError::new(
            ErrorType::Quota,
            "The AI provider refused the request: rate limit or quota exceeded".to_string(),
        )
        .with_suggestions(vec![
            "Wait a moment and try again".to_string(),
            "Check the usage limits and billing of your account".to_string(),
            "Switch to a local model by setting \"provider\": \"ollama\" in the config".to_string(),
        ]),
        CompletionError::Unknown(_) => UserFriendlyError::new(
            ErrorType::Provider,
            "The AI provider returned an unexpected error".to_string(),
        )
        .with_suggestions(vec![
            "Try the question again".to_string(),
            "Check the configured model name: heycli config".to_string(),
        ]),
    };
    friendly.with_technical_details(error.to_string())
}

/// Convert errors surfacing at startup or in maintenance commands
pub fn enhance_error(error: &anyhow::Error) -> UserFriendlyError {
    if let Some(completion) = error.downcast_ref::<CompletionError>() {
        return explain_completion_error(completion);
    }

    if let Some(history) = error.downcast_ref::<HistoryError>() {
        let suggestions = match history {
            HistoryError::Malformed { path, .. } => vec![
                format!("Fix or remove the file: {}", path.display()),
                "The history file must be a JSON array of strings".to_string(),
            ],
            HistoryError::Io { path, .. } => vec![
                format!("Check permissions on {}", path.display()),
                "Set \"history_path\" in the config to a writable location".to_string(),
            ],
        };
        return UserFriendlyError::new(ErrorType::History, "Could not use the history file".to_string())
            .with_suggestions(suggestions)
            .with_technical_details(error.to_string());
    }

    let error_msg = error.to_string().to_lowercase();

    if error_msg.contains("keyring") || error_msg.contains("api key") {
        return UserFriendlyError::new(
            ErrorType::Authentication,
            "No usable API key was found".to_string(),
        )
        .with_suggestions(vec![
            "Set OPENAI_API_KEY in your environment or in a .env file".to_string(),
            "Or store the key in the OS keyring: heycli set-key <key>".to_string(),
        ])
        .with_technical_details(error.to_string());
    }

    if error_msg.contains("config") {
        return UserFriendlyError::new(
            ErrorType::Configuration,
            "Configuration issue detected".to_string(),
        )
        .with_suggestions(vec![
            "Check your configuration: heycli config".to_string(),
            "Reset to defaults by deleting ~/.config/heycli/config.json".to_string(),
        ])
        .with_technical_details(error.to_string());
    }

    if error_msg.contains("timeout") || error_msg.contains("timed out") {
        return UserFriendlyError::new(
            ErrorType::Timeout,
            "The operation timed out".to_string(),
        )
        .with_suggestion("Try again".to_string())
        .with_technical_details(error.to_string());
    }

    UserFriendlyError::new(ErrorType::General, "An unexpected error occurred".to_string())
        .with_suggestions(vec![
            "Try the command again".to_string(),
            "Report this issue if it persists".to_string(),
        ])
        .with_technical_details(error.to_string())
}

pub fn display_success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

pub fn display_info(message: &str) {
    println!("{} {}", "💡".cyan(), message.dimmed());
}
