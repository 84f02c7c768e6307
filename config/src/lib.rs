//! # Configuration System
//!
//! Configuration resolution for the comfydeck deployment toolkit.
//!
//! This crate provides:
//! - An ordered INI document model (`[SECTION]` / `key = value`, multiline
//!   values via indentation continuation)
//! - Secret redirection: values equal to the `.env` sentinel resolve from
//!   environment variables populated by a secrets file
//! - A typed, immutable [`Settings`] record built once per invocation and
//!   passed explicitly to every consumer (no ambient global state)
//!
//! # Best Practices
//!
//! - Fallbacks apply only to absent keys; a present-but-malformed value is a
//!   fatal configuration error naming the offending section and key
//! - Token keys keep their exact case in the document (they double as
//!   environment variable names); the resolved settings map normalizes
//!   them to lowercase

pub mod document;
pub mod secrets;
pub mod settings;

pub use document::{ConfigDocument, IniSection};
pub use secrets::{SECRET_SENTINEL, load_secrets_file, resolve_value};
pub use settings::{FilesystemSettings, ResourceSettings, Settings, WebSettings};
