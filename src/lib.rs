//! Desktop explorer for the public datasets of a DataDock server.
//!
//! Rows of a dataset are fetched once and then filtered, narrowed to a set
//! of columns and exported without further round trips for the filtering.

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod session;
pub mod state;
pub mod ui;
