use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

/// Privacy-preserving file logger for heycli
///
/// Prompts, replies and history entries are never handed to the logger; only
/// operational events (startup, provider outcomes, history persistence,
/// clipboard availability) are recorded. Messages still pass through
/// redaction so a stray path or key in an error string does not land on disk.
pub struct PrivacyLogger {
    log_file_path: PathBuf,
    debug_mode: bool,
    writer: Arc<Mutex<Option<fs::File>>>,
}

/// A single structured log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    pub context: Option<LogContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogCategory {
    System,
    Configuration,
    Provider,
    History,
    Clipboard,
}

/// Extra key/value details attached to an entry
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    pub component: Option<String>,
    pub operation: Option<String>,
    pub duration_ms: Option<u64>,
    pub error_code: Option<String>,
    pub provider: Option<String>,
    pub success: Option<bool>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error_code(mut self, error_code: &str) -> Self {
        self.error_code = Some(error_code.to_string());
        self
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }
}

impl PrivacyLogger {
    /// Create a logger writing to `<config_dir>/heycli/heycli.log`
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create a logger writing to an explicit file
    pub fn with_path(log_file_path: PathBuf) -> Result<Self> {
        if let Some(parent) = log_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            log_file_path,
            debug_mode: false,
            writer: Arc::new(Mutex::new(None)),
        })
    }

    /// Debug entries are dropped unless this is switched on (HEYCLI_DEBUG)
    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn log_error(&self, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        self.log(LogLevel::Error, category, message, context)
    }

    pub fn log_warning(&self, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        self.log(LogLevel::Warning, category, message, context)
    }

    pub fn log_info(&self, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        self.log(LogLevel::Info, category, message, context)
    }

    pub fn log_debug(&self, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        if !self.debug_mode {
            return Ok(());
        }
        self.log(LogLevel::Debug, category, message, context)
    }

    fn log(&self, level: LogLevel, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            category,
            message: self.redact_sensitive_info(&message),
            context,
        };
        self.write_log_entry(&entry)
    }

    pub fn log_startup(&self, version: &str, os_info: &str) -> Result<()> {
        let context = LogContext::new()
            .with_component("system")
            .with_operation("startup");

        self.log_info(
            LogCategory::System,
            format!("heycli {} started on {}", version, os_info),
            Some(context),
        )
    }

    /// Record the outcome of one completion call. Only timing and status, never content.
    pub fn log_provider_call(&self, provider: &str, duration_ms: u64, error_code: Option<&str>) -> Result<()> {
        let success = error_code.is_none();
        let mut context = LogContext::new()
            .with_component("provider")
            .with_operation("complete")
            .with_provider(provider)
            .with_duration_ms(duration_ms)
            .with_success(success);
        if let Some(code) = error_code {
            context = context.with_error_code(code);
        }

        let level = if success { LogLevel::Info } else { LogLevel::Warning };
        let message = format!(
            "Provider {} complete: {} ({}ms)",
            provider,
            if success { "success" } else { "failed" },
            duration_ms
        );

        self.log(level, LogCategory::Provider, message, Some(context))
    }

    fn default_log_path() -> Result<PathBuf> {
        let mut log_path =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
        log_path.push("heycli");
        log_path.push("heycli.log");
        Ok(log_path)
    }

    fn write_log_entry(&self, entry: &LogEntry) -> Result<()> {
        let mut writer_guard = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Failed to acquire log writer lock"))?;

        if writer_guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_file_path)?;
            *writer_guard = Some(file);
        }

        if let Some(ref mut file) = *writer_guard {
            writeln!(file, "{}", self.format_log_entry(entry))?;
            file.flush()?;
        }

        Ok(())
    }

    fn format_log_entry(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        let level = format!("{:?}", entry.level).to_uppercase();
        let category = format!("{:?}", entry.category).to_uppercase();

        let mut formatted = format!("[{}] {} {} {}", timestamp, level, category, entry.message);

        if let Some(ref context) = entry.context {
            let mut parts = Vec::new();
            if let Some(ref component) = context.component {
                parts.push(format!("component={}", component));
            }
            if let Some(ref operation) = context.operation {
                parts.push(format!("operation={}", operation));
            }
            if let Some(duration) = context.duration_ms {
                parts.push(format!("duration={}ms", duration));
            }
            if let Some(ref error_code) = context.error_code {
                parts.push(format!("error={}", error_code));
            }
            if let Some(ref provider) = context.provider {
                parts.push(format!("provider={}", provider));
            }
            if let Some(success) = context.success {
                parts.push(format!("success={}", success));
            }

            if !parts.is_empty() {
                formatted.push_str(&format!(" [{}]", parts.join(", ")));
            }
        }

        formatted
    }

    fn redact_sensitive_info(&self, message: &str) -> String {
        static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            [
                (r"/home/[^/\s]+", "/home/[USER]"),
                (r"/Users/[^/\s]+", "/Users/[USER]"),
                (r"api_key=\S+", "api_key=[REDACTED]"),
                (r"token=\S+", "token=[REDACTED]"),
                (r"password=\S+", "password=[REDACTED]"),
                (r"sk-[A-Za-z0-9_-]{8,}", "sk-[REDACTED]"),
            ]
            .into_iter()
            .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
            .collect()
        });

        patterns
            .iter()
            .fold(message.to_string(), |acc, (re, replacement)| {
                re.replace_all(&acc, *replacement).into_owned()
            })
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_file_path
    }
}

static GLOBAL_LOGGER: OnceLock<Arc<Mutex<PrivacyLogger>>> = OnceLock::new();

/// Initialize the process-wide logger
pub fn init_logger() -> Result<()> {
    let mut logger = PrivacyLogger::new()?;
    let debug = std::env::var("HEYCLI_DEBUG")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    logger.set_debug_mode(debug);
    let _ = GLOBAL_LOGGER.set(Arc::new(Mutex::new(logger)));
    Ok(())
}

pub fn get_logger() -> Result<Arc<Mutex<PrivacyLogger>>> {
    GLOBAL_LOGGER
        .get()
        .cloned()
        .ok_or_else(|| anyhow!("Logger not initialized. Call init_logger() first."))
}

#[macro_export]
macro_rules! log_error {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_error($category, $message.to_string(), None);
            }
        }
    };
    ($category:expr, $message:expr, $context:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_error($category, $message.to_string(), Some($context));
            }
        }
    };
}

#[macro_export]
macro_rules! log_warning {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_warning($category, $message.to_string(), None);
            }
        }
    };
    ($category:expr, $message:expr, $context:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_warning($category, $message.to_string(), Some($context));
            }
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_info($category, $message.to_string(), None);
            }
        }
    };
    ($category:expr, $message:expr, $context:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_info($category, $message.to_string(), Some($context));
            }
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_debug($category, $message.to_string(), None);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_logger() -> (PrivacyLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = PrivacyLogger::with_path(temp_dir.path().join("logs").join("test.log")).unwrap();
        (logger, temp_dir)
    }

    #[test]
    fn test_with_path_creates_parent_directory() {
        let (logger, temp_dir) = create_test_logger();
        assert!(temp_dir.path().join("logs").is_dir());
        assert!(!logger.is_debug_mode());
    }

    #[test]
    fn test_log_error() {
        let (logger, _temp_dir) = create_test_logger();

        logger
            .log_error(LogCategory::History, "Failed to persist history".to_string(), None)
            .unwrap();

        let log_content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(log_content.contains("ERROR"));
        assert!(log_content.contains("HISTORY"));
        assert!(log_content.contains("Failed to persist history"));
    }

    #[test]
    fn test_log_with_context() {
        let (logger, _temp_dir) = create_test_logger();

        let context = LogContext::new()
            .with_component("clipboard")
            .with_operation("copy")
            .with_success(true);
        logger
            .log_info(LogCategory::Clipboard, "Copied command".to_string(), Some(context))
            .unwrap();

        let log_content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(log_content.contains("component=clipboard"));
        assert!(log_content.contains("operation=copy"));
        assert!(log_content.contains("success=true"));
    }

    #[test]
    fn test_debug_entries_need_debug_mode() {
        let (mut logger, _temp_dir) = create_test_logger();

        logger
            .log_debug(LogCategory::System, "hidden detail".to_string(), None)
            .unwrap();
        if logger.log_path().exists() {
            let log_content = fs::read_to_string(logger.log_path()).unwrap();
            assert!(!log_content.contains("hidden detail"));
        }

        logger.set_debug_mode(true);
        logger
            .log_debug(LogCategory::System, "visible detail".to_string(), None)
            .unwrap();
        let log_content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(log_content.contains("DEBUG"));
        assert!(log_content.contains("visible detail"));
    }

    #[test]
    fn test_redact_sensitive_info() {
        let (logger, _temp_dir) = create_test_logger();

        let message = "open /home/alice/.heycli_history failed, api_key=abc123 token=zzz and sk-proj1234567890abc";
        let redacted = logger.redact_sensitive_info(message);

        assert!(redacted.contains("/home/[USER]"));
        assert!(redacted.contains("api_key=[REDACTED]"));
        assert!(redacted.contains("token=[REDACTED]"));
        assert!(redacted.contains("sk-[REDACTED]"));
        assert!(!redacted.contains("alice"));
        assert!(!redacted.contains("abc123"));
        assert!(!redacted.contains("sk-proj1234567890abc"));
    }

    #[test]
    fn test_log_provider_call() {
        let (logger, _temp_dir) = create_test_logger();

        logger.log_provider_call("openai", 1500, None).unwrap();
        logger.log_provider_call("openai", 20, Some("quota")).unwrap();

        let log_content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(log_content.contains("Provider openai complete: success (1500ms)"));
        assert!(log_content.contains("Provider openai complete: failed (20ms)"));
        assert!(log_content.contains("error=quota"));
        assert!(log_content.contains("WARNING"));
    }

    #[test]
    fn test_log_startup() {
        let (logger, _temp_dir) = create_test_logger();

        logger.log_startup("0.1.0", "linux x86_64").unwrap();

        let log_content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(log_content.contains("heycli 0.1.0 started on linux x86_64"));
        assert!(log_content.contains("operation=startup"));
    }

    #[test]
    fn test_log_entry_formatting() {
        let (logger, _temp_dir) = create_test_logger();

        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Warning,
            category: LogCategory::Provider,
            message: "Test formatting".to_string(),
            context: Some(
                LogContext::new()
                    .with_provider("ollama")
                    .with_duration_ms(42)
                    .with_error_code("transient"),
            ),
        };

        let formatted = logger.format_log_entry(&entry);
        assert!(formatted.contains("WARNING PROVIDER Test formatting"));
        assert!(formatted.contains("duration=42ms"));
        assert!(formatted.contains("error=transient"));
        assert!(formatted.contains("provider=ollama"));
    }
}
