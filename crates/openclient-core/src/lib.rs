//! openclient Core Library
//!
//! This library generates typed Rust API clients from OpenAPI documents, and
//! carries the [`runtime`] those clients are compiled against.
//!
//! Generation is a two-pass pipeline (see [`codegen`]): named schemas are
//! registered first, then models, services and security configurators are
//! emitted and rendered through [`builders`] and [`templates`].

pub mod builders;
pub mod codegen;
pub mod config;
pub mod error;
pub mod generate;
pub mod openapi;
pub mod runtime;
pub mod templates;
pub mod utils;

pub use crate::{
    config::Config,
    error::{Error, Result},
    generate::{generate, generate_units, GeneratedUnit},
    openapi::OpenApiContext,
    templates::{TemplateRenderer, UnitTemplate},
};
