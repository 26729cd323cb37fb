//! TechLabs - content API for events, blog posts and admin login
//!
//! This library provides the storage, services and HTTP layers of the
//! TechLabs backend. The binary in `main.rs` wires them together.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
