pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod drag;
pub mod error;
pub mod format;
pub mod gateway;
pub mod kanban_board;
pub mod session;
pub mod task;
pub mod telemetry;
pub mod ui;
pub mod user;
