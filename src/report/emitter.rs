//! Device report emitter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{AbortHook, DeviceChannel, DeviceMessage, Job, JobSequencer, SyncError};

use super::{CONFIGURE_KEY, ERROR_KEY, PROGRESS_KEY};

/// Prompt sent when no API token is configured.
pub const CONFIGURE_PROMPT: &str = "Please provide your Personal Access Token in settings.";

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Sends progress, success, error and configuration messages to the device.
///
/// Progress is advisory and queued; success is queued and a nack aborts the
/// run; errors and prompts bypass the queue.
#[derive(Clone)]
pub struct ReportEmitter {
    channel: Arc<dyn DeviceChannel>,
    max_error_len: usize,
}

impl ReportEmitter {
    /// Emitter sending over `channel`, truncating error text to
    /// `max_error_len` characters.
    pub fn new(channel: Arc<dyn DeviceChannel>, max_error_len: usize) -> Self {
        Self {
            channel,
            max_error_len,
        }
    }

    /// Enqueue a progress report. Delivery failure is logged and the run
    /// proceeds.
    pub fn enqueue_progress(&self, sequencer: &JobSequencer, text: &str) {
        let channel = Arc::clone(&self.channel);
        let message = DeviceMessage::new().with(PROGRESS_KEY, text);
        let text = text.to_string();
        sequencer.enqueue(Job::new(format!("report progress: {text}"), async move {
            tracing::info!("Report {PROGRESS_KEY}: {text}");
            if let Err(e) = channel.send(&message).await {
                tracing::warn!("progress report not delivered: {e}");
            }
            Ok(())
        }));
    }

    /// Enqueue the terminal success message. A nack aborts the run.
    pub fn enqueue_success(&self, sequencer: &JobSequencer, message: DeviceMessage) {
        let log_text = format!("send: {}", message.keys_summary());
        sequencer.enqueue_message(Arc::clone(&self.channel), message, log_text);
    }

    /// Send the terminal error message now, outside the queue.
    pub async fn report_error(&self, error: &SyncError) {
        let text = truncate_chars(&error.device_text(), self.max_error_len);
        let message = DeviceMessage::new().with(ERROR_KEY, text.as_str());
        match self.channel.send(&message).await {
            Ok(()) => tracing::error!("Reported error to watch: {text}"),
            Err(e) => {
                tracing::error!("Could not even send an error message to the watch! {text} ({e})");
            }
        }
    }

    /// Ask the user to configure an API token.
    pub async fn prompt_configure(&self) {
        self.send_configure(DeviceMessage::new().with(CONFIGURE_KEY, CONFIGURE_PROMPT))
            .await;
    }

    /// Tell the device a configuration page is open.
    pub async fn configuring(&self) {
        self.send_configure(DeviceMessage::new().with(CONFIGURE_KEY, "Configuring."))
            .await;
    }

    /// Tell the device configuration was closed without changes.
    pub async fn configuration_cancelled(&self) {
        self.send_configure(DeviceMessage::new().with(CONFIGURE_KEY, 0)).await;
    }

    async fn send_configure(&self, message: DeviceMessage) {
        if let Err(e) = self.channel.send(&message).await {
            tracing::error!("Could not send configuration message: {e}");
        } else {
            tracing::info!(keys = %message.keys_summary(), "configuration message sent");
        }
    }
}

#[async_trait]
impl AbortHook for ReportEmitter {
    async fn on_abort(&self, error: &SyncError) {
        self.report_error(error).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DrainOutcome;
    use crate::infra::RecordingChannel;
    use serde_json::json;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("日本語です", 2), "日本");
    }

    #[tokio::test]
    async fn test_error_text_is_truncated() {
        let channel = Arc::new(RecordingChannel::new());
        let reports = ReportEmitter::new(channel.clone(), 128);
        reports
            .report_error(&SyncError::Provider("x".repeat(300)))
            .await;

        let sent = channel.delivered_with(ERROR_KEY);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].get(ERROR_KEY), Some(&json!("x".repeat(128))));
    }

    #[tokio::test]
    async fn test_progress_nack_does_not_abort() {
        let channel = Arc::new(RecordingChannel::new());
        channel.reject_key(PROGRESS_KEY);
        let reports = ReportEmitter::new(channel.clone(), 128);
        let seq = JobSequencer::new();
        reports.enqueue_progress(&seq, "Consulting the Crabigator");
        seq.enqueue(Job::noop("next"));

        assert_eq!(seq.start().await, DrainOutcome::Completed { jobs_run: 2 });
    }

    #[tokio::test]
    async fn test_success_nack_aborts() {
        let channel = Arc::new(RecordingChannel::new());
        channel.reject_key("SUCCESS");
        let reports = ReportEmitter::new(channel.clone(), 128);
        let seq = JobSequencer::new().with_abort_hook(Arc::new(reports.clone()));
        reports.enqueue_success(&seq, DeviceMessage::new().with("SUCCESS", true));

        assert!(matches!(
            seq.start().await,
            DrainOutcome::Aborted {
                error: SyncError::Channel(_),
                ..
            }
        ));
        let errors = channel.delivered_with(ERROR_KEY);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].get(ERROR_KEY), Some(&json!("Could not reach the watch.")));
    }

    #[tokio::test]
    async fn test_configure_prompt() {
        let channel = Arc::new(RecordingChannel::new());
        ReportEmitter::new(channel.clone(), 128).prompt_configure().await;
        assert_eq!(
            channel.delivered(),
            vec![DeviceMessage::new().with(CONFIGURE_KEY, CONFIGURE_PROMPT)]
        );
    }
}
