//! Port traits the domain and CLI program against.

pub mod config_port;
pub mod stock_port;
