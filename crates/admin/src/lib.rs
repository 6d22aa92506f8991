//! Moonstone Admin library.
//!
//! This crate provides the admin functionality as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! # Security
//!
//! This crate contains HIGH PRIVILEGE access:
//! - Order, inventory and customer management
//! - Newsletter sends to every subscriber
//! - Claude API (blog generation)
//!
//! Bind it to a private interface; it is not meant to face the internet.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod claude;
pub mod config;
pub mod content;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
