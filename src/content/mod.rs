//! Content module - documents, front matter and parsing

mod document;
pub mod fence;
mod frontmatter;
pub mod loader;
mod parser;

pub use document::{CodeBlock, Document, RawDocument};
pub use frontmatter::{parse_date_string, FrontMatter};
pub use parser::{parse, parse_with, serialize, slug_from_source, SOURCE_EXTENSIONS};
