// Export job - A running encoder invocation with cancel and progress

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::ports::EncoderPort;

/// Handle to an export running on the tokio runtime
///
/// Dropping the handle detaches the job; it keeps running to completion.
pub struct ExportHandle {
    request: ExportRequest,
    cancel: Option<oneshot::Sender<()>>,
    progress: watch::Receiver<ExportProgress>,
    task: JoinHandle<Result<EncodeReport, DomainError>>,
    outcome: Option<ExportOutcome>,
}

impl ExportHandle {
    /// Start the encoder for `request` in a background task
    pub fn spawn(encoder: Arc<dyn EncoderPort>, request: ExportRequest) -> Self {
        let (progress_tx, progress_rx) = watch::channel(ExportProgress::new(request.duration_ms));
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let job_request = request.clone();
        let task = tokio::spawn(async move {
            encoder.encode(&job_request, progress_tx, cancel_rx).await
        });

        Self {
            request,
            cancel: Some(cancel_tx),
            progress: progress_rx,
            task,
            outcome: None,
        }
    }

    pub fn request(&self) -> &ExportRequest {
        &self.request
    }

    /// Latest progress snapshot
    pub fn progress(&self) -> ExportProgress {
        *self.progress.borrow()
    }

    /// Receiver for observing progress from elsewhere
    pub fn subscribe(&self) -> watch::Receiver<ExportProgress> {
        self.progress.clone()
    }

    /// Ask the encoder to stop; returns false if already requested or finished
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(sender) => sender.send(()).is_ok(),
            None => false,
        }
    }

    /// Wait for the job to end; safe to call again after it resolved
    pub async fn join(&mut self) -> ExportOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let outcome = match (&mut self.task).await {
            Ok(Ok(report)) => ExportOutcome::Completed(report),
            Ok(Err(e)) if e.is_cancellation() => ExportOutcome::Cancelled,
            Ok(Err(e)) => ExportOutcome::Failed(e),
            Err(e) => ExportOutcome::Failed(DomainError::InternalError(format!(
                "export task failed: {}",
                e
            ))),
        };
        debug!("Export to {} ended: {:?}", self.request.output.display(), outcome);

        self.cancel = None;
        self.outcome = Some(outcome.clone());
        outcome
    }
}
