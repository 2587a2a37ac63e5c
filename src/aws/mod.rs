//! AWS API interaction module
//!
//! Everything that talks to AWS lives here, behind the [`client::ResourceClient`]
//! trait so the inventory engine never touches SDK types directly.
//!
//! # Module Structure
//!
//! - [`context`] - Shared SDK configuration and per-region client factories
//! - [`client`] - The adapter trait and its SDK-backed implementation
//! - [`records`] - Typed resource records the rest of the crate consumes

pub mod client;
pub mod context;
pub mod records;
