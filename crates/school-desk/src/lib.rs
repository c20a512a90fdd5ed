//! Client core for the school-desk management console.
//!
//! Talks to the school-management REST API and models the school-year
//! management screen as plain state: a cached query layer, a selection store,
//! dialog machines, and CSV/XLSX export. Front ends drive [`screen`] and
//! render whatever it holds.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod notify;
pub mod queries;
pub mod screen;
pub mod session;
pub mod shell;
pub mod store;
pub mod telemetry;

pub use error::AppError;
