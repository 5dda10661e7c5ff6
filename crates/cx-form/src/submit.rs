//! Submission
//!
//! Submitting validates the whole document, then hands it to the caller's
//! success callback or the errors to the failure callback. Callback errors
//! are logged and absorbed; they never reach the caller or touch form state.

use std::future::Future;
use std::sync::Arc;

use cx_schema::ValidationError;
use serde_json::Value;

use crate::store::Form;

/// What a submission did
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Document was valid and the success callback completed
    Submitted,
    /// Document was invalid; the failure callback (if any) completed
    Invalid(Vec<ValidationError>),
    /// A callback returned an error, which was logged
    CallbackFailed,
}

impl SubmitOutcome {
    #[inline]
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

type NoErrorHandler = fn(Vec<ValidationError>) -> std::future::Ready<anyhow::Result<()>>;

impl Form {
    /// Validate and submit the document
    ///
    /// `on_submit` receives a snapshot of the document when it is valid.
    /// The form stays borrowed until the callback completes.
    pub async fn handle_submit<F, Fut>(&self, on_submit: F) -> SubmitOutcome
    where
        F: FnOnce(Arc<Value>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.submit(on_submit, None::<NoErrorHandler>).await
    }

    /// Validate and submit, routing validation errors to `on_error`
    pub async fn handle_submit_or_else<F, Fut, E, EFut>(
        &self,
        on_submit: F,
        on_error: E,
    ) -> SubmitOutcome
    where
        F: FnOnce(Arc<Value>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
        E: FnOnce(Vec<ValidationError>) -> EFut,
        EFut: Future<Output = anyhow::Result<()>>,
    {
        self.submit(on_submit, Some(on_error)).await
    }

    async fn submit<F, Fut, E, EFut>(&self, on_submit: F, on_error: Option<E>) -> SubmitOutcome
    where
        F: FnOnce(Arc<Value>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
        E: FnOnce(Vec<ValidationError>) -> EFut,
        EFut: Future<Output = anyhow::Result<()>>,
    {
        let validation = self.validate(None);
        if validation.success {
            tracing::debug!(form_key = %self.key(), "submitting form");
            return match on_submit(self.value()).await {
                Ok(()) => SubmitOutcome::Submitted,
                Err(err) => {
                    tracing::error!(form_key = %self.key(), error = %err, "submit callback failed");
                    SubmitOutcome::CallbackFailed
                }
            };
        }

        tracing::debug!(
            form_key = %self.key(),
            errors = validation.errors.len(),
            "submission blocked by validation"
        );
        let Some(on_error) = on_error else {
            return SubmitOutcome::Invalid(validation.errors);
        };
        match on_error(validation.errors.clone()).await {
            Ok(()) => SubmitOutcome::Invalid(validation.errors),
            Err(err) => {
                tracing::error!(form_key = %self.key(), error = %err, "error callback failed");
                SubmitOutcome::CallbackFailed
            }
        }
    }
}
