//! Add/edit form state and submit-time validation.
//!
//! `BookForm` keeps the raw text the user typed. Nothing is checked while
//! typing; `validate` runs on explicit submit and either yields a request
//! body or the per-field messages to show inline.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{Book, BookDetails, BookFormat, BookKind, BookPatch};

/// Message for a missing required value
pub const REQUIRED: &str = "Required";

/// Message for a length that does not parse as a number
pub const NOT_A_NUMBER: &str = "Must be a number";

/// Whether the form creates a new book or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit,
}

/// Input fields, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Title,
    Author,
    Genre,
    Kind,
    Length,
    Description,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Title,
        FormField::Author,
        FormField::Genre,
        FormField::Kind,
        FormField::Length,
        FormField::Description,
    ];

    /// Next field in tab order (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Author,
            FormField::Author => FormField::Genre,
            FormField::Genre => FormField::Kind,
            FormField::Kind => FormField::Length,
            FormField::Length => FormField::Description,
            FormField::Description => FormField::Title,
        }
    }

    /// Previous field in tab order (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Description,
            FormField::Author => FormField::Title,
            FormField::Genre => FormField::Author,
            FormField::Kind => FormField::Genre,
            FormField::Length => FormField::Kind,
            FormField::Description => FormField::Length,
        }
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<FormField, String>);

impl FormErrors {
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(field, msg)| format!("{:?}: {}", field, msg)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for FormErrors {}

/// Raw values of the add/edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookForm {
    pub mode: FormMode,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub brief_description: String,
    pub length: String,
    kind: BookKind,
}

impl BookForm {
    /// Empty add form. New books default to paper.
    pub fn new_book() -> Self {
        Self {
            mode: FormMode::Add,
            title: String::new(),
            author: String::new(),
            genre: String::new(),
            brief_description: String::new(),
            length: "0".to_string(),
            kind: BookKind::Paper,
        }
    }

    /// Edit form prefilled from `book`; the kind is locked to the book's own
    pub fn edit(book: &Book) -> Self {
        let details = &book.details;
        Self {
            mode: FormMode::Edit,
            title: details.title.clone(),
            author: details.author.clone(),
            genre: details.genre.clone(),
            brief_description: details.brief_description.clone(),
            length: details.format.length().to_string(),
            kind: details.format.kind(),
        }
    }

    pub fn kind(&self) -> BookKind {
        self.kind
    }

    pub fn kind_locked(&self) -> bool {
        self.mode == FormMode::Edit
    }

    /// Change the book kind. Ignored in edit mode; returns whether it changed.
    pub fn set_kind(&mut self, kind: BookKind) -> bool {
        if self.kind_locked() || self.kind == kind {
            return false;
        }
        self.kind = kind;
        true
    }

    /// Mutable access to a text field, `None` for the kind selector
    pub fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut self.title),
            FormField::Author => Some(&mut self.author),
            FormField::Genre => Some(&mut self.genre),
            FormField::Length => Some(&mut self.length),
            FormField::Description => Some(&mut self.brief_description),
            FormField::Kind => None,
        }
    }

    pub fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Title => Some(&self.title),
            FormField::Author => Some(&self.author),
            FormField::Genre => Some(&self.genre),
            FormField::Length => Some(&self.length),
            FormField::Description => Some(&self.brief_description),
            FormField::Kind => None,
        }
    }

    fn length_too_small_message(&self) -> &'static str {
        match (self.mode, self.kind) {
            (FormMode::Add, _) => "Value must be more than 0",
            (FormMode::Edit, BookKind::Paper) => "Pages must be more than 0",
            (FormMode::Edit, BookKind::Audio) => "Minutes must be more than 0",
        }
    }

    fn validate_length(&self) -> Result<u32, String> {
        let raw = self.length.trim();
        if raw.is_empty() {
            return Err(REQUIRED.to_string());
        }
        let value: f64 = raw.parse().map_err(|_| NOT_A_NUMBER.to_string())?;
        if !value.is_finite() {
            return Err(NOT_A_NUMBER.to_string());
        }
        if value <= 0.0 {
            return Err(self.length_too_small_message().to_string());
        }
        if value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err("Must be a whole number".to_string());
        }
        Ok(value as u32)
    }

    /// Check every field and build the request body.
    ///
    /// Title, author and genre must be non-blank; the length must be a whole
    /// number above zero. The description is optional.
    pub fn validate(&self) -> Result<BookDetails, FormErrors> {
        let mut errors = FormErrors::default();

        for field in [FormField::Title, FormField::Author, FormField::Genre] {
            if self.text(field).is_some_and(|v| v.trim().is_empty()) {
                errors.insert(field, REQUIRED);
            }
        }

        let length = match self.validate_length() {
            Ok(length) => Some(length),
            Err(message) => {
                errors.insert(FormField::Length, message);
                None
            }
        };

        match length {
            Some(length) if errors.is_empty() => Ok(BookDetails {
                title: self.title.trim().to_string(),
                author: self.author.trim().to_string(),
                genre: self.genre.trim().to_string(),
                brief_description: self.brief_description.trim().to_string(),
                format: BookFormat::new(self.kind, length),
            }),
            _ => Err(errors),
        }
    }

    /// Validate and turn the form into a full-field update body
    pub fn to_patch(&self) -> Result<BookPatch, FormErrors> {
        self.validate().map(BookPatch::from)
    }
}

// ============================================================================
// Tests
// ============================================================================
