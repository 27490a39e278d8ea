//! btrpsl-core: compiler for btrpsl placement scripts.
//!
//! A script declares a namespace, VMs and nodes instantiated from
//! templates, placement constraints, and values exported to other
//! scripts. Building a script lexes and parses its source, then evaluates
//! the syntax tree into a [`Script`], collecting every diagnostic on the
//! way.
//!
//! # Public API
//!
//! - [`ScriptBuilder`] -- build entry points, from a string or a file
//! - [`Script`] -- a built script: elements, constraints, exports, imports
//! - [`ConstraintsCatalog`] -- constraint keywords and their builders
//! - [`Includes`] -- where imported scripts come from
//! - [`BuildError`], [`Diagnostic`] -- build failures
//! - [`interchange::to_json`] -- JSON view of a built script

pub mod ast;
pub mod builder;
pub mod cache;
pub mod constraint;
pub mod error;
mod eval;
pub mod includes;
pub mod interchange;
pub mod lexer;
pub mod model;
pub mod namespace;
pub mod operand;
pub mod parser;
pub mod range;
pub mod script;
pub mod symbols;
pub mod template;

// ── Convenience re-exports ───────────────────────────────────────────

pub use builder::ScriptBuilder;
pub use cache::ScriptCache;
pub use constraint::{
    default_catalog, ArgValue, Constraint, ConstraintBuilder, ConstraintKind, ConstraintsCatalog,
    ParamSpec,
};
pub use error::{BuildError, Diagnostic};
pub use eval::ME;
pub use includes::{BasicIncludes, Includes, PathBasedIncludes};
pub use model::{Element, ElementKind, InMemoryNamingService, NamingService};
pub use operand::{BtrpSet, Number, Operand, OperandType};
pub use script::Script;
pub use template::{DefaultTemplateFactory, StandardTemplate, Template, TemplateFactory};
