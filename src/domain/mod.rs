//! Core domain types and view logic. No I/O.

pub mod record;
pub mod table;
pub mod stats;
pub mod form;
pub mod dropdown;
pub mod dashboard;
pub mod settings;
pub mod error;
