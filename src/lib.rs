//! Library exports for the link shortener
//!
//! This module exposes internal components for testing and library usage.

pub mod allocator;
pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod resolver;
pub mod route;
pub mod store;
pub mod validation;

#[cfg(test)]
mod test_support;
