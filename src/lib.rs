//! fieldsync - Debounced bilingual field translation
//!
//! Keeps a pair of name fields (one per language) filled in: a pause in
//! typing in either field sends its text to the form's translation endpoint
//! and writes the result into the other field.

pub mod binder;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod error;
pub mod language;
pub mod page;
pub mod token;
pub mod translate;
pub mod trigger;
