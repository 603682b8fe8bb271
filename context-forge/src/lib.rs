//! # Context Forge - Data Context for Language Models
//!
//! Context Forge ingests CSV, JSON/JSON Lines and free-form log files, infers
//! a schema, computes per-column statistics and assembles a compact text
//! context that fits a fixed token budget. The context is meant to be handed
//! to a language model together with a user's question about the data.
//!
//! ## Quick Start
//!
//! ```rust
//! use context_forge::prelude::*;
//!
//! let content = "region,revenue,closed\nnorth,1200,true\nsouth,800,false\n";
//! let data = Parser::for_file_type(FileType::Csv).parse(content, 1000)?;
//!
//! let stats = StatisticsCalculator::new().calculate(&data);
//! let builder = ContextBuilder::new();
//! let context = builder.build_context(&data, Some(&stats));
//!
//! assert!(context.estimated_tokens <= 3000);
//! let prompt = builder.build_full_prompt(&context, "Which region earned more?");
//! assert!(prompt.contains("- revenue: Integer"));
//! # Ok::<(), context_forge::error::ParseError>(())
//! ```
//!
//! ## Key Features
//!
//! ### Format detection
//!
//! - **CSV**: delimiter chosen from `,`, `;`, tab and `|` by first-line counts;
//!   quoted fields with doubled quotes
//! - **JSON**: a top-level array, a single object, or one object per line;
//!   nested objects are flattened to dotted column names
//! - **Logs**: bracketed, Apache access, simple and key=value layouts, with a
//!   raw single-column fallback
//!
//! ### Token budgeting
//!
//! The context is split into schema, statistics and data sample sections,
//! each truncated deterministically to its own share of a 3000-token budget.
//! Large tables are sampled head, seeded random middle and tail, so the same
//! input always yields the same context.
//!
//! ### Async import
//!
//! [`pipeline::DataPipeline`] runs parses on tokio blocking workers and
//! reports staged progress as a `futures::Stream`. Dropping the stream
//! cancels the parse at its next batch.
//!
//! ## Architecture
//!
//! - **`model`**: schema, rows, statistics, context and file descriptors
//! - **`parsers`**: the three format parsers, progress reporting and streaming
//! - **`analyzers`**: type inference, statistics and sampling
//! - **`context`**: token budget and context assembly
//! - **`pipeline`**: the caller-facing import/analyze layer
//! - **`config`**, **`logging`**, **`error`**: ambient configuration
//! - **`gguf`**: model file magic check

pub mod analyzers;
pub mod config;
pub mod context;
pub mod error;
pub mod gguf;
pub mod logging;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod prelude;
