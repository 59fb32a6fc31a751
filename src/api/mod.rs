//! API Module - Presentation Boundary
//!
//! The only surface a presentation layer talks to. No UI state lives here;
//! every command is a full synchronous pipeline pass.

pub mod commands;
