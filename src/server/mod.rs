//! Server module for building the HTTP server

pub mod builder;
pub mod registry;

pub use builder::{ServerBuilder, cors_layer};
pub use registry::{ResourceDescriptor, ResourceRegistry};
