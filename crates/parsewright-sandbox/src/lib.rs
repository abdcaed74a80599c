//! Parsewright Sandbox
//!
//! Runs untrusted, generated extraction routines behind a process boundary.
//!
//! # Architecture
//!
//! ```text
//! source + document → scratch dir → interpreter subprocess → stdout JSON → TabularResult
//! ```
//!
//! Each execution gets a fresh scratch directory holding the candidate script
//! and a private copy of the sample document. The interpreter runs there with
//! a cleared environment, a wall-clock limit and a cap on stdout. On Unix it
//! leads its own process group, and the whole group is killed when the
//! interpreter exits or times out. Whatever the
//! candidate does, the caller receives either a well-formed table or an
//! [`ExecutionFault`](parsewright_domain::ExecutionFault).
//!
//! # Output protocol
//!
//! The candidate prints one JSON object to stdout:
//!
//! ```text
//! {"columns": [{"name": "Date", "type": "text"}, ...], "rows": [["01-08-2024", ...], ...]}
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use parsewright_domain::traits::Sandbox;
//! use parsewright_sandbox::{SandboxConfig, SubprocessSandbox};
//! use std::path::Path;
//!
//! # async fn example() {
//! let sandbox = SubprocessSandbox::new(SandboxConfig::default()).unwrap();
//! match sandbox.execute("print('hi')", Path::new("data/icici/icici_sample.pdf")).await {
//!     Ok(table) => println!("{} rows", table.row_count()),
//!     Err(fault) => println!("candidate failed: {}", fault),
//! }
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod decode;
mod group;
mod subprocess;

pub use config::{SandboxConfig, SandboxConfigError};
pub use decode::decode_output;
pub use subprocess::SubprocessSandbox;
