//! Pipeline stages for both conversion directions.
//!
//! Each submodule implements exactly one step and is independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! inbound:   input ──▶ extract ──▶ postprocess ──▶ (output formatting)
//!            (path/URL) (bytes→md)  (cleanup)
//!
//! outbound:  render
//!            (md → docx/pptx/html via external tool)
//! ```
//!
//! 1. [`input`]       — read a local file or fetch a URL into memory
//! 2. [`extract`]     — the [`extract::InboundConverter`] seam and the
//!    built-in text-format converter
//! 3. [`postprocess`] — deterministic Markdown normalisation
//! 4. [`render`]      — the external renderer gateway: availability cache,
//!    argument sanitisation, subprocess invocation

pub mod extract;
pub mod input;
pub mod postprocess;
pub mod render;
