//! In-memory resource graph for declarative infrastructure configurations.
//!
//! Input: configuration text (HCL: `resource`, `data`, `variable`, `locals`, `provider`,
//! `output` and `module` blocks).
//! Output: an immutable [`Graph`] whose references have been checked, plus resolution of
//! references to concrete values.
//!
//! This crate does no filesystem IO; callers hand it text.

#![forbid(unsafe_code)]

mod deps;
mod error;
mod model;
mod parse;
mod resolve;
mod value;

pub use error::GraphError;
pub use model::{
    Graph, Local, Mode, Module, Output, Provider, Resource, ResourceAddress, VarType, Variable,
};
pub use parse::{parse, parse_file, parse_files, parse_tfvars};
pub use resolve::{InputValue, Resolver};
pub use value::{Attributes, Reference, Value};

#[cfg(test)]
mod proptest;
