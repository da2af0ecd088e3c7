//! Python syntax tree plumbing: parsing, the arena tree, and name resolution.

mod name;
mod parser;
mod tree;

pub use name::dotted_name;
pub use parser::{ParseError, ParsedSource, PythonParser, SyntaxErrorNode};
pub use tree::{NodeId, Span, SyntaxTree};
