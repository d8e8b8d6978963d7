//! Vista Core Types and Definitions
//!
//! This crate provides the foundational types used by the Vista diagram
//! enhancer. It includes:
//!
//! - **Identifiers**: Stable handles for document nodes ([`identifier::NodeId`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Viewport**: The pan/zoom engine wrapped around one rendered diagram ([`viewport`] module)

pub mod geometry;
pub mod identifier;
pub mod viewport;
