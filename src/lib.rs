//! VPack — a compact binary document format for JSON-superset values.
//!
//! Values are encoded into a self-describing, tagged, variable-width binary
//! layout: scalars carry their type in a single head byte, compounds carry
//! length fields and optional index tables that make member access O(1) and
//! key lookup O(log n) on sorted objects.
//!
//! # Architecture
//!
//! - **`format`** — head byte constants, fixed-width and varint fields
//! - **`types`** — logical [`ValueType`]s and the [`Value`] input carrier
//! - **`builder`** — incremental encoder assembling valid buffers
//! - **`slice`** — zero-copy views decoding buffers in place
//! - **`parser`** — JSON text → encoded values
//! - **`dump`** — encoded values → JSON text, via [`Sink`]s
//! - **`collection`** — filter/map/keep/remove/merge over encoded values
//!
//! # Example
//!
//! ```
//! use vpack::{collection, Parser};
//!
//! let builder = Parser::from_json(r#"{"b":2,"a":1}"#)?;
//! let slice = builder.slice()?;
//! assert_eq!(collection::keys(slice)?, vec!["a", "b"]);
//! assert_eq!(slice.get("b")?.unwrap().get_int()?, 2);
//! # Ok::<(), vpack::Error>(())
//! ```

pub mod builder;
pub mod collection;
pub mod dump;
pub mod error;
pub mod format;
pub mod options;
pub mod parser;
pub mod sink;
pub mod slice;
pub mod types;

pub use builder::Builder;
pub use dump::{dump_to_string, Dumper};
pub use error::{Error, Result};
pub use options::{Options, PaddingBehavior, UnsupportedTypeBehavior};
pub use parser::Parser;
pub use sink::{BufferSink, LengthSink, Sink, StringSink, WriterSink};
pub use slice::{ArrayIter, ObjectIter, Slice};
pub use types::{Value, ValueType};
