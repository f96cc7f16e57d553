//! File input for documents.

pub mod reader;

pub use reader::{TEXT_EXTENSIONS, document_name, read_document};
