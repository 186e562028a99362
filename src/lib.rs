//! Typed wrappers around common Linux utilities.
//!
//! A [`Toolkit`] runs `ls`, `mkdir`, `grep`, `kill` and friends as child
//! processes (never through a shell), bounded by a timeout, and keeps an
//! in-memory [`HistoryLog`] with one [`ExecutionResult`] per attempt,
//! including attempts that failed to launch or timed out.
//!
//! ```no_run
//! use lcat::{MkdirOptions, Toolkit};
//! use std::time::Duration;
//!
//! let toolkit = Toolkit::new(Duration::from_secs(30)).unwrap();
//! let result = toolkit
//!     .mkdir(&MkdirOptions { path: "build".into(), parents: true, ..Default::default() })
//!     .unwrap();
//! assert_eq!(result.success, result.return_code == Some(0));
//! assert_eq!(toolkit.history().len(), 1);
//! ```

pub mod args;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod executor;
pub mod history;
pub mod i18n;
pub mod repl;
pub mod storage;

pub use catalog::{
    ChmodOptions, ChownOptions, FileKind, FindOptions, FreeOptions, GrepOptions, KillOptions, LsOptions, MemUnit,
    MkdirOptions, PsOptions, RmOptions, SortBy, Toolkit, TopOptions, TouchOptions,
};
pub use error::ArgError;
pub use executor::{Outcome, ProcessRunner};
pub use history::HistoryLog;
pub use storage::{ErrorKind, ExecutionResult};
