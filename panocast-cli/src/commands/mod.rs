//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`download`] - Batch acquisition over route targets
//! - [`fetch`] - Single location acquisition
//! - [`init`] - Configuration initialization

pub mod common;
pub mod download;
pub mod fetch;
pub mod init;
