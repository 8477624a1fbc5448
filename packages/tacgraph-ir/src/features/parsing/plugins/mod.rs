//! Language plugins
//!
//! One lowering profile per grammar. Each module exposes a lazily built
//! `PROFILE` plus the construct-specific handlers its tables point at.

pub mod c;
pub mod cpp;
pub mod csharp;
pub mod go;
pub mod java;
pub mod javascript;
pub mod kotlin;
pub mod lua;
pub mod pascal;
pub mod php;
pub mod python;
pub mod registry;
pub mod ruby;
pub mod rust_lang;
pub mod scala;
pub mod typescript;

pub use registry::{profile_for, ProfileRegistry};
