//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and store access so route handlers
//! can stay focused on protocol translation and auth plumbing. Every
//! operation takes `&dyn ContentStore` and returns `Result<_, ApiError>`.

pub mod articles;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod seed;
pub mod session;
pub mod storage;
pub mod text;
pub mod tournaments;
pub mod upload;
pub mod users;
