//! Pattern code: syntax tree, Strudel renderer and generator.

pub mod ast;
pub mod generator;
pub mod render;

pub use ast::{apply, Mutation, MutationKind, Node, NodeId, NodeIdAllocator, NodeKind, Tree};
pub use generator::{generate, minimal_pattern, GeneratedPattern, GenerationInput};
