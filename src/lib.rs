//! Taskdraft: natural-language task extraction.
//!
//! Turns a free-form description ("routine check for VIN X at Y next
//! Monday") into a structured [`types::ExtractedTask`]. A local generative
//! model is asked first; if it is unreachable, slow, or returns something
//! unusable, a deterministic rule-based extractor takes over. Callers always
//! get a valid task back.
//!
//! See `DESIGN.md` for the architecture and grounding notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dates;
pub mod extractors;
pub mod logging;
pub mod pipeline;
pub mod providers;
pub mod types;
