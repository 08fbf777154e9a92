#![allow(clippy::result_large_err)]
//! sapling-core: the Sapling compiler backend.
//!
//! Translates one merged module of the block-scoped source language into
//! a set of command and predicate files (a datapack, laid out on disk by
//! `sapling-codegen`). Compilation is two passes over the AST: analysis
//! binds every name and allocates every file without emitting anything,
//! then the reference pass evaluates the deferred-operation tree and
//! emits all commands.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`compile()`] -- run both passes over a [`Module`]
//! - [`Compiler`] -- the owning compilation value
//! - [`CompiledPack`] -- the finished units, ready for layout
//! - [`Config`] -- project configuration (`sapling.toml`)
//! - [`CompileError`] -- compilation error type
//! - AST types: [`Module`], [`Stmt`], [`Expr`], [`Provenance`]

pub mod analyze;
pub mod ast;
pub mod blocks;
pub mod builtins;
pub mod command;
pub mod compile;
pub mod config;
pub mod construct;
pub mod emit;
pub mod error;
pub mod names;
pub mod path;
pub mod predicate;
pub mod reference;
pub mod scope;
pub mod value;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Expr, Module, Provenance, Stmt};
pub use command::Command;
pub use compile::{compile, CompiledPack, Compiler};
pub use config::{Config, ScopeMode};
pub use emit::{CodeUnit, FileKind};
pub use error::CompileError;
pub use path::AttributePath;
pub use predicate::Predicate;
pub use value::Value;
