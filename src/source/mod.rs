//! Source Files
//!
//! Reading single files, classifying their language, and discovering
//! documentable files for batch mode.

pub mod language;
pub mod reader;
pub mod scanner;

pub use language::Language;
pub use reader::SourceFile;
pub use scanner::{FileScanner, discover};
