//! Data models for catalogue entities.
//!
//! - `Book`: a server-assigned id plus `BookDetails`
//! - `BookFormat`: audio (minutes) or paper (pages)
//! - `BookPatch`: partial update body

pub mod book;

pub use book::{Book, BookDetails, BookFormat, BookId, BookKind, BookPatch};
