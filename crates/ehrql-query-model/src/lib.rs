//! ehrQL query model
//!
//! This crate provides:
//! - The node types of the query model and their computed metadata
//! - A hash-consed [`QueryGraph`] whose constructors type-check every node
//! - Table schemas, column constraints and the [`TableRegistry`]
//! - [`Dataset`] definitions
//! - Graph traversal and a JSON serialized form

pub mod dataset;
pub mod error;
pub mod graph;
pub mod model;
pub mod registry;
pub mod schema;
pub mod serialize;
pub mod signatures;
mod traversal;

pub use dataset::{Dataset, POPULATION};
pub use error::{ModelResult, TypeValidationError, ValidationReason};
pub use graph::QueryGraph;
pub use model::{AggregateKind, Args, Domain, Function, Node, NodeId, NodeKind, NodeMeta, Position};
pub use registry::{TableDefinition, TableKind, TableRegistry};
pub use schema::{Column, Constraint, PATIENT_ID, Schema};
pub use serialize::{SerializeError, SerializedGraph, SerializedNode};
