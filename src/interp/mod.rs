//! Interpreter module - runtime values and the tree-walking executor

pub mod executor;
pub mod value;
