//! Request middleware.
//!
//! Purpose: attach request-lifecycle concerns that apply to every route.
//! Authentication is not middleware here; it is the `Identity` extractor on
//! protected handlers.

pub mod trace;

pub use trace::Trace;
