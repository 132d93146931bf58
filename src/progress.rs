//! Terminal spinner shown while the model is thinking.

use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};

use crate::llm::{LlmClient, LlmError, ModelReply, ModelRequest};

const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// A single-line spinner. It stops when finished or dropped, whichever comes first.
pub struct Spinner {
    bar: ProgressBar,
    message: String,
}

impl Spinner {
    /// Start a spinner on stderr.
    pub fn start(message: &str) -> Self {
        Self::with_bar(ProgressBar::new_spinner(), message)
    }

    fn with_bar(bar: ProgressBar, message: &str) -> Self {
        let style = ProgressStyle::with_template("{msg}{spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["|", "/", "-", "\\", ""]);
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(TICK_INTERVAL);

        Self {
            bar,
            message: message.to_string(),
        }
    }

    /// Stop ticking and leave `outcome` after the message on the line.
    pub fn finish(&self, outcome: &str) {
        if !self.bar.is_finished() {
            self.bar
                .finish_with_message(format!("{}{}", self.message, outcome));
        }
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        // Cancelled mid-call: still stop the ticker and end the line.
        self.finish("interrupted");
    }
}

/// Wraps a model client so every call shows a spinner until it returns.
pub struct SpinningClient<C> {
    inner: C,
    message: String,
}

impl<C: LlmClient> SpinningClient<C> {
    pub fn new(inner: C, message: impl Into<String>) -> Self {
        Self {
            inner,
            message: message.into(),
        }
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for SpinningClient<C> {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, LlmError> {
        let spinner = Spinner::start(&self.message);
        let result = self.inner.generate(request).await;
        spinner.finish(if result.is_ok() { "Done!" } else { "Failed!" });
        result
    }
}
