use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned book identifier.
pub type BookId = i64;

/// Which length field a book carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum BookKind {
    Audio,
    Paper,
}

impl BookKind {
    /// Label of the length input for this kind
    pub fn length_label(&self) -> &'static str {
        match self {
            BookKind::Audio => "Minutes",
            BookKind::Paper => "Pages",
        }
    }

    /// The other kind, used by the kind selector
    pub fn toggled(&self) -> Self {
        match self {
            BookKind::Audio => BookKind::Paper,
            BookKind::Paper => BookKind::Audio,
        }
    }
}

impl fmt::Display for BookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookKind::Audio => write!(f, "Audio"),
            BookKind::Paper => write!(f, "Paper"),
        }
    }
}

/// Format-specific part of a book.
///
/// On the wire there is no tag: an object carrying `minutes` is an audio book,
/// one carrying `pages` is a paper book. `Audio` is tried first, so a payload
/// with both fields decodes as audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum BookFormat {
    Audio { minutes: u32 },
    Paper { pages: u32 },
}

impl BookFormat {
    pub fn new(kind: BookKind, length: u32) -> Self {
        match kind {
            BookKind::Audio => BookFormat::Audio { minutes: length },
            BookKind::Paper => BookFormat::Paper { pages: length },
        }
    }

    pub fn kind(&self) -> BookKind {
        match self {
            BookFormat::Audio { .. } => BookKind::Audio,
            BookFormat::Paper { .. } => BookKind::Paper,
        }
    }

    /// Minutes or pages, whichever this format carries
    pub fn length(&self) -> u32 {
        match *self {
            BookFormat::Audio { minutes } => minutes,
            BookFormat::Paper { pages } => pages,
        }
    }

    /// Text for the table's Details column
    pub fn label(&self) -> String {
        match self {
            BookFormat::Audio { minutes } => format!("{} minutes", minutes),
            BookFormat::Paper { pages } => format!("{} pages", pages),
        }
    }
}

/// A book without its identifier. This is the body of `POST /books`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(default)]
    pub brief_description: String,
    #[serde(flatten)]
    pub format: BookFormat,
}

impl BookDetails {
    /// Apply the fields present in `patch`, leaving the rest as they are.
    pub fn apply(&mut self, patch: &BookPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(ref author) = patch.author {
            self.author = author.clone();
        }
        if let Some(ref genre) = patch.genre {
            self.genre = genre.clone();
        }
        if let Some(ref description) = patch.brief_description {
            self.brief_description = description.clone();
        }
        if let Some(format) = patch.format {
            self.format = format;
        }
    }
}

/// A catalogue entry as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Book {
    pub id: BookId,
    #[serde(flatten)]
    pub details: BookDetails,
}

impl Book {
    pub fn new(id: BookId, details: BookDetails) -> Self {
        Self { id, details }
    }

    pub fn kind(&self) -> BookKind {
        self.details.format.kind()
    }

    pub fn details_label(&self) -> String {
        self.details.format.label()
    }
}

/// Partial update body for `PUT /books/{id}`. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief_description: Option<String>,
    #[serde(flatten)]
    pub format: Option<BookFormat>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<BookDetails> for BookPatch {
    fn from(details: BookDetails) -> Self {
        Self {
            title: Some(details.title),
            author: Some(details.author),
            genre: Some(details.genre),
            brief_description: Some(details.brief_description),
            format: Some(details.format),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
