//! fnpush-core - Core library for fnpush
//!
//! This crate provides the build-package-deploy pipeline for pushing a single
//! Go function to AWS Lambda, including:
//! - Settings file parsing and deployment target resolution
//! - Cross-compilation via the Go toolchain
//! - In-memory zip packaging under Lambda's entry-name convention
//! - Object store and function service seams with AWS implementations
//! - Pipeline orchestration with unconditional artifact cleanup

pub mod archive;
pub mod aws;
pub mod build;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod remote;

pub use error::{Error, Result};
