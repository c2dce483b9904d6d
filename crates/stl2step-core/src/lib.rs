//! # stl2step-core
//!
//! Core crate for stl2step. Contains the configuration schema, the
//! converter capability trait and the unified error system.
//!
//! This crate has **no** internal dependencies on other stl2step crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use config::AppConfig;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use traits::converter::{ConversionOutcome, ConversionRequest, MeshConverter, SolidStrategy};
