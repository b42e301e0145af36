//! Add/edit dialog state.
//!
//! The dialog moves `open -> submitting -> closed` on success. A failed
//! validation keeps it open with inline messages; a failed request keeps it
//! open with a banner. Cancelling closes it from any state.

use bookshelf_core::form::{BookForm, FormErrors, FormField};
use bookshelf_core::{Book, BookDetails, BookId, BookPatch};

/// Maximum length for text inputs.
const MAX_TEXT_LENGTH: usize = 200;

/// Maximum length for the pages/minutes input.
const MAX_LENGTH_DIGITS: usize = 9;

/// Which book the dialog is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogTarget {
    New,
    Existing(BookId),
}

/// Request the dialog wants sent once its form is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(BookDetails),
    Update(BookId, BookPatch),
}

#[derive(Debug, Clone)]
pub struct BookDialog {
    pub target: DialogTarget,
    pub form: BookForm,
    pub focus: FormField,
    pub errors: FormErrors,
    pub submitting: bool,
    /// Banner text after a failed request
    pub failure: Option<String>,
}

impl BookDialog {
    pub fn add() -> Self {
        Self::with_form(DialogTarget::New, BookForm::new_book())
    }

    pub fn edit(book: &Book) -> Self {
        Self::with_form(DialogTarget::Existing(book.id), BookForm::edit(book))
    }

    fn with_form(target: DialogTarget, form: BookForm) -> Self {
        Self {
            target,
            form,
            focus: FormField::Title,
            errors: FormErrors::default(),
            submitting: false,
            failure: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.target {
            DialogTarget::New => "Add Book",
            DialogTarget::Existing(_) => "Edit Book",
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Type a character into the focused field. Returns whether it was accepted.
    pub fn input_char(&mut self, c: char) -> bool {
        if self.submitting || c.is_control() {
            return false;
        }
        if self.focus == FormField::Kind {
            if c == ' ' {
                self.toggle_kind();
                return true;
            }
            return false;
        }

        let limit = if self.focus == FormField::Length {
            MAX_LENGTH_DIGITS
        } else {
            MAX_TEXT_LENGTH
        };
        match self.form.text_mut(self.focus) {
            Some(text) if text.chars().count() < limit => {
                text.push(c);
                true
            }
            _ => false,
        }
    }

    pub fn backspace(&mut self) {
        if self.submitting {
            return;
        }
        if let Some(text) = self.form.text_mut(self.focus) {
            text.pop();
        }
    }

    /// Switch between audio and paper; no effect when editing
    pub fn toggle_kind(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        let kind = self.form.kind().toggled();
        self.form.set_kind(kind)
    }

    /// Validate and, if valid, enter the submitting state.
    ///
    /// Returns `None` while a submission is already running or when the form
    /// has errors; in the latter case the errors are stored for display.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if self.submitting {
            return None;
        }

        let submission = match self.target {
            DialogTarget::New => self.form.validate().map(Submission::Create),
            DialogTarget::Existing(id) => self.form.to_patch().map(|patch| Submission::Update(id, patch)),
        };

        match submission {
            Ok(submission) => {
                self.errors = FormErrors::default();
                self.failure = None;
                self.submitting = true;
                Some(submission)
            }
            Err(errors) => {
                if let Some(first) = errors.fields().next() {
                    self.focus = first;
                }
                self.errors = errors;
                None
            }
        }
    }

    /// The request failed; stay open and show why
    pub fn submit_failed(&mut self, message: String) {
        self.submitting = false;
        self.failure = Some(message);
    }
}
