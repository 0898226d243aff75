//! # pdf-swap-api
//!
//! HTTP front end for the pdf-swap library: a multipart `POST /api` that
//! returns the merged PDF, plus the CLI, logging and configuration of the
//! `pdf-swap` server binary.

mod api;
pub mod config;
pub mod decoder;
pub mod error;
pub mod logging;

pub use api::{app, health_check, index, swap_pdf, AppState};
pub use self::config::{Cli, LogFormat, LoggerConfig, ServerConfig};
pub use decoder::decode;
pub use error::{ApiError, ErrorResponse};
