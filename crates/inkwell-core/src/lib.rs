//! # Inkwell Core
//!
//! The domain layer of the Inkwell blogging platform.
//! Entities, ports and the listing/feed services live here with zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod services;

pub use error::DomainError;
pub use pagination::{PAGE_SIZE, Page, PageRequest, PageWindow, Paginator};
