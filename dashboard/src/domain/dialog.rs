//! Form dialog controller.
//!
//! A dialog owns one draft. Submitting validates it first; only a
//! [`Validated`] draft is handed to the save action, so invalid input never
//! reaches the network. Failures keep the dialog open for a retry.

use std::future::Future;

use tracing::debug;

use crate::domain::Error;
use crate::domain::validation::{FieldErrors, Validate, Validated};

/// Tone of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast-style message shown after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    kind: NoticeKind,
    message: String,
}

impl Notice {
    /// Positive confirmation.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// Failure report.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Result of [`FormDialog::submit`].
#[derive(Debug)]
pub enum SubmitOutcome<T> {
    /// Validation failed; nothing was sent.
    Invalid(FieldErrors),
    /// The save action failed; the dialog stays open.
    Failed(Error),
    /// Saved; the dialog closed.
    Saved(T),
}

/// Open/closed state, draft, field errors and notice of one form dialog.
///
/// # Examples
/// ```
/// use dashboard::domain::{BrandDraft, FormDialog, SubmitOutcome};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut dialog = FormDialog::new("Brand saved");
/// dialog.open(BrandDraft::default());
/// let outcome = dialog
///     .submit(|_draft| async { Ok::<_, dashboard::domain::Error>(()) })
///     .await;
/// assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
/// assert_eq!(dialog.field_errors().get("name"), Some("Name is required"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct FormDialog<D> {
    open: bool,
    draft: D,
    field_errors: FieldErrors,
    notice: Option<Notice>,
    success_message: String,
}

impl<D: Validate + Clone + Default> FormDialog<D> {
    /// A closed dialog announcing `success_message` after a save.
    pub fn new(success_message: impl Into<String>) -> Self {
        Self {
            open: false,
            draft: D::default(),
            field_errors: FieldErrors::new(),
            notice: None,
            success_message: success_message.into(),
        }
    }

    /// Open with `draft` (empty for create, prefilled for edit).
    pub fn open(&mut self, draft: D) {
        self.open = true;
        self.draft = draft;
        self.field_errors = FieldErrors::new();
        self.notice = None;
    }

    /// Close without saving.
    pub fn close(&mut self) {
        self.open = false;
        self.field_errors = FieldErrors::new();
    }

    /// Change the draft in place.
    pub fn edit(&mut self, change: impl FnOnce(&mut D)) {
        change(&mut self.draft);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Validate the draft and, when it passes, run `save` with it.
    pub async fn submit<T, F, Fut>(&mut self, save: F) -> SubmitOutcome<T>
    where
        F: FnOnce(Validated<D>) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let validated = match self.draft.clone().validated() {
            Ok(validated) => validated,
            Err(errors) => {
                debug!(fields = errors.len(), "form rejected by validation");
                self.field_errors = errors.clone();
                self.notice = None;
                return SubmitOutcome::Invalid(errors);
            }
        };
        self.field_errors = FieldErrors::new();
        match save(validated).await {
            Ok(saved) => {
                self.open = false;
                self.notice = Some(Notice::success(self.success_message.clone()));
                SubmitOutcome::Saved(saved)
            }
            Err(error) => {
                self.notice = Some(Notice::error(error.message()));
                SubmitOutcome::Failed(error)
            }
        }
    }
}
