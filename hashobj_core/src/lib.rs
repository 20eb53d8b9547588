//! # hashobj core
//!
//! Computes object ids for content and optionally writes the content into a
//! content-addressed store.
//!
//! An object id is the BLAKE3 digest of `"<type> <size>\0"` followed by the
//! content, so identical content of the same type always maps to the same id.
//!
//! ## Features
//!
//! - Validation of input mode combinations ([`RunConfig`])
//! - Files from the command line, one object from stdin, or a batch of
//!   (optionally C-quoted) paths from stdin ([`Ingester`])
//! - Work-tree relative paths when writing into a discovered store
//! - Sharded, optionally zstd-compressed object files written atomically
//!
//! ## Example
//!
//! ```no_run
//! use hashobj_core::{Algorithm, Ingester, Options, RunConfig, Store};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::init("./.hashobj", Algorithm::Blake3)?;
//!
//! let config = RunConfig::from_options(Options {
//!     write: true,
//!     files: vec!["README.md".to_string()],
//!     ..Options::default()
//! })?;
//!
//! let mut ingester = Ingester::new(&config, None, &store, std::io::stdout());
//! ingester.run(std::io::empty())?;
//! # Ok(())
//! # }
//! ```

mod database;
mod error;
mod hash;
mod ingest;
mod journal;
mod mode;
mod object;
mod path;
mod quote;
mod store;

pub use database::{HashOnly, ObjectDatabase};
pub use error::{Error, Result};
pub use hash::{Algorithm, HASH_SIZE, Hash};
pub use ingest::{Ingester, InputSpec, Source};
pub use journal::{Journal, JournalEntry};
pub use mode::{Mode, Options, RunConfig};
pub use object::{ObjectHeader, ObjectType};
pub use path::{RootContext, normalize};
pub use quote::unquote_line;
pub use store::{STORE_DIR, STORE_DIR_ENV, Store, discover_root};
