//! Shared records and wire types for the Proverbs scripture catalogue.
//!
//! Nothing in here touches storage: the database crate maps its rows onto
//! these types and the API crate serializes them.

pub mod api;
pub mod forms;
pub mod models;
pub mod passage;

pub use models::ChapterVerse;
pub use passage::{PassageRange, min_max_verse};
