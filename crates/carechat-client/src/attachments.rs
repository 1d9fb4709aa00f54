//! Attachment upload pipeline: selected -> uploading -> resolved.
//!
//! Selection only validates size; the session inserts the placeholder and
//! calls [`AttachmentPipeline::begin`] on send. Every upload, successful or
//! not, reports back exactly one [`UploadOutcome`] on the pipeline's
//! channel, which is what lets the session always resolve its placeholder.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use carechat_net::{AttachmentFile, AttachmentUploader};
use carechat_shared::types::{ConversationId, Message, MessageId};

use crate::error::AttachmentError;

/// Result of one upload, delivered back to the session loop.
#[derive(Debug)]
pub struct UploadOutcome {
    pub conversation_id: ConversationId,
    pub placeholder_id: MessageId,
    pub file_name: String,
    /// The uploaded file's URL, or why there is none.
    pub result: Result<String, String>,
}

pub struct AttachmentPipeline {
    uploader: Arc<dyn AttachmentUploader>,
    max_size: usize,
    selected: Option<AttachmentFile>,
    in_flight: HashSet<MessageId>,
    outcome_tx: mpsc::UnboundedSender<UploadOutcome>,
}

impl AttachmentPipeline {
    pub fn new(
        uploader: Arc<dyn AttachmentUploader>,
        max_size: usize,
    ) -> (Self, mpsc::UnboundedReceiver<UploadOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let pipeline = Self {
            uploader,
            max_size,
            selected: None,
            in_flight: HashSet::new(),
            outcome_tx,
        };
        (pipeline, outcome_rx)
    }

    /// Stage `file` for the next send. Oversized files are refused and any
    /// earlier selection stays staged.
    pub fn select(&mut self, file: AttachmentFile) -> Result<(), AttachmentError> {
        if file.size() > self.max_size {
            return Err(AttachmentError::TooLarge {
                size: file.size(),
                max: self.max_size,
            });
        }

        debug!(file_name = %file.name, size = file.size(), "Attachment selected");
        self.selected = Some(file);
        Ok(())
    }

    pub fn discard(&mut self) -> Option<AttachmentFile> {
        self.selected.take()
    }

    pub fn selected(&self) -> Option<&AttachmentFile> {
        self.selected.as_ref()
    }

    /// Start uploading `file`, which `placeholder` stands in for.
    pub fn begin(&mut self, file: AttachmentFile, placeholder: &Message) {
        let conversation_id = placeholder.conversation_id.clone();
        let placeholder_id = placeholder.id.clone();
        let file_name = file.name.clone();

        info!(
            file_name = %file_name,
            size = file.size(),
            placeholder = %placeholder_id,
            "Attachment upload started"
        );

        self.in_flight.insert(placeholder_id.clone());
        let upload = self.uploader.upload(file);
        let outcome_tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            // The upload runs in its own task so a panic in it still
            // produces an outcome.
            let result = match tokio::spawn(upload).await {
                Ok(Ok(response)) => response.into_file_url().map_err(|e| e.to_string()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("Upload task aborted: {e}")),
            };

            let outcome = UploadOutcome {
                conversation_id,
                placeholder_id,
                file_name,
                result,
            };
            if outcome_tx.send(outcome).is_err() {
                debug!("Upload finished after the session stopped");
            }
        });
    }

    /// Mark an upload as resolved. Returns `false` for unknown placeholders.
    pub fn finish(&mut self, placeholder_id: &MessageId) -> bool {
        self.in_flight.remove(placeholder_id)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
