pub mod api;
pub mod config;
pub mod controller;
pub mod formatter;
pub mod logging;
pub mod models;
pub mod session;
pub mod timeframe;
