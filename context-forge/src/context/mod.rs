//! Token budgeting and prompt context assembly.
//!
//! ```rust
//! use context_forge::context::ContextBuilder;
//! use context_forge::parsers::{CsvParser, FileParser};
//!
//! let data = CsvParser::new().parse("city,temp\nOslo,4\nRome,18\n", 1000).unwrap();
//! let builder = ContextBuilder::new();
//! let context = builder.build_context(&data, None);
//!
//! assert!(context.schema_description.starts_with("Columns (2):"));
//! let prompt = builder.build_full_prompt(&context, "Which city is warmest?");
//! assert!(prompt.ends_with("Which city is warmest?\n"));
//! ```

pub mod budget;
pub mod builder;

pub use budget::{truncate_chars, TokenBudgetManager, CHARS_PER_TOKEN};
pub use builder::ContextBuilder;
