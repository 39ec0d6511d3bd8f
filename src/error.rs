use std::future::Future;
use thiserror::Error;

/// Error taxonomy for product crawling.
///
/// A selector that matches nothing is never an error: it surfaces as
/// [`crate::crawl::fields::Field::Absent`] or an empty `Vec`. Everything in
/// this enum is an unexpected failure that is logged and propagated.
#[derive(Error, Debug)]
pub enum ScrapeError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // Selector errors
    #[error("Invalid selector: {selector} ({reason})")]
    InvalidSelector { selector: String, reason: String },

    #[error("Locator not supported by this session: {locator}")]
    UnsupportedLocator { locator: String },

    // Browser errors
    #[error("Browser error: {message}")]
    Browser { message: String },

    #[error("Navigation failed: {url} - {message}")]
    Navigation { url: String, message: String },

    #[error("Page not ready: {selector} did not appear after {attempts} attempts on {url}")]
    UnreadyPage {
        url: String,
        selector: String,
        attempts: usize,
    },

    #[error("Feature not enabled: {feature}")]
    FeatureDisabled { feature: String },

    // System errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ScrapeError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a browser error
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser { message: message.into() }
    }

    /// Create an invalid selector error
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::InvalidSelector { .. } | Self::UnsupportedLocator { .. } => "selector",
            Self::Browser { .. } | Self::Navigation { .. } => "browser",
            Self::UnreadyPage { .. } => "readiness",
            Self::FeatureDisabled { .. } => "feature",
            Self::Io(_) | Self::Serialization(_) => "system",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for product crawling
pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;

/// Identity of the operation an error occurred in
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub operation: String,
    pub component: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub additional_data: Vec<(String, String)>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            component: component.into(),
            timestamp: chrono::Utc::now(),
            additional_data: Vec::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_data.push((key.into(), value.into()));
        self
    }

    fn data_summary(&self) -> String {
        self.additional_data
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Render an error and its `source()` chain as `outer -> inner -> ...`.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        chain.push(inner.to_string());
        source = inner.source();
    }
    chain.join(" -> ")
}

/// Run `operation` and, if it fails, log the failure together with the
/// operation identity before handing the error back unchanged.
///
/// Every public crawling operation goes through this wrapper.
pub async fn instrumented<T, F>(context: ErrorContext, operation: F) -> ScrapeResult<T>
where
    F: Future<Output = ScrapeResult<T>>,
{
    match operation.await {
        Ok(value) => Ok(value),
        Err(error) => {
            log_failure(&context, &error);
            Err(error)
        }
    }
}

/// Emit the diagnostic record for a failed operation.
pub fn log_failure(context: &ErrorContext, error: &ScrapeError) {
    tracing::error!(
        component = %context.component,
        operation = %context.operation,
        error_category = error.category(),
        started_at = %context.timestamp.to_rfc3339(),
        data = %context.data_summary(),
        chain = %error_chain(error),
        "EXCEPTION in {}::{}",
        context.component,
        context.operation
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_error_category() {
        let error = ScrapeError::config("Invalid setting");
        assert_eq!(error.category(), "configuration");

        let error = ScrapeError::invalid_selector("div[", "unexpected end");
        assert_eq!(error.category(), "selector");
        assert!(error.to_string().contains("div["));
    }

    #[test]
    fn test_error_chain_includes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "snapshot missing");
        let error = ScrapeError::from(io);
        let chain = error_chain(&error);

        assert!(chain.starts_with("I/O error"));
        assert!(chain.contains("snapshot missing"));
    }

    #[tokio::test]
    async fn test_instrumented_passes_values_through() {
        let context = ErrorContext::new("find_all", "locator");
        let value = instrumented(context, async { Ok::<_, ScrapeError>(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_instrumented_returns_error_unchanged() {
        let context = ErrorContext::new("reload", "session").with_data("url", "https://example.com");
        let result: ScrapeResult<()> =
            instrumented(context, async { Err(ScrapeError::browser("session crashed")) }).await;

        match result {
            Err(ScrapeError::Browser { message }) => assert_eq!(message, "session crashed"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_instrumented_logs_failure_before_returning_it() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "snapshot missing");
        let context = ErrorContext::new("from_files", "snapshot").with_data("file", "page.html");
        let result: ScrapeResult<()> = instrumented(context, async { Err(ScrapeError::from(io)) }).await;

        assert!(matches!(result, Err(ScrapeError::Io(_))));
        let output = logs.contents();
        assert!(output.contains("EXCEPTION in snapshot::from_files"));
        assert!(output.contains("error_category=\"system\""));
        assert!(output.contains("file=page.html"));
        assert!(output.contains("snapshot missing"));
    }

    #[tokio::test]
    async fn test_instrumented_success_logs_nothing() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        instrumented(ErrorContext::new("find", "locator"), async { Ok::<_, ScrapeError>(()) })
            .await
            .unwrap();

        assert!(logs.contents().is_empty());
    }
}
