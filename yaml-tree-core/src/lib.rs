//! Order-preserving document trees for YAML and JSON, with field-level editing.

pub mod edit;
pub mod parser;
pub mod tree;
pub mod writer;

pub use parser::{parse, parse_file, ParseError};
pub use tree::{Node, Scalar, TreeError};
pub use writer::{write, write_file, Format, WriteError};
