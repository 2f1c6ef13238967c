//! HTTP request handlers (controller glue around the auth core).

pub mod auth;
pub mod user;
