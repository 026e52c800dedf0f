//! amalgam-core: merges a multi-file header-only library into one header.
//!
//! Starting from a root header, every `#include <prefix...>` that names one of
//! the library's own headers is replaced by that header's body, depth first,
//! each header at most once. Everything else (system and third-party includes,
//! declarations, comments after the guard) is copied through in order.
//!
//! The merged output carries a generated banner, exactly one include guard,
//! optional begin/end markers around each inlined header, and never two
//! blank lines in a row.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use amalgam_core::amalgamate::{run, AmalgamOptions};
//! use amalgam_core::banner::{generation_time, Banner};
//!
//! let banner = Banner {
//!     title: "JSON for C++".into(),
//!     url: "https://github.com/ascheglov/json-cpp".into(),
//!     license: "Belongs to the public domain".into(),
//!     version: "0.1 alpha".into(),
//!     revision: "unknown".into(),
//!     generated: generation_time(),
//! };
//!
//! let merged = run(
//!     "json-cpp.hpp",
//!     Path::new("include"),
//!     Path::new("single_include/json-cpp.hpp"),
//!     &banner,
//!     &AmalgamOptions::default(),
//! )?;
//! println!("inlined {} headers", merged.documents.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod amalgamate;
pub mod banner;
pub mod config;
pub mod directive;
pub mod error;
pub mod output;
pub mod smoke;
pub mod source;

pub use error::{AmalgamError, Result};
