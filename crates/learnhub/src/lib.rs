//! Assessment attempts, certification, notifications, and course
//! recommendations for an employee learning platform.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod store;
pub mod telemetry;
pub mod workflows;
