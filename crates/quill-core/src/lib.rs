//! # Quill Core
//!
//! The domain layer of the Quill blog backend: post lifecycle rules, slug
//! derivation, tag normalization, image constraints and listing queries.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod query;
pub mod service;

pub use error::{DomainError, RepoError};
pub use service::PostService;
