// ABOUTME: Library crate for orca exposing the app, backend client and components for testing

pub mod app;
pub mod backend;
pub mod components;
pub mod config;
pub mod diff;
pub mod format;
pub mod logs;
pub mod models;
pub mod terminal;
