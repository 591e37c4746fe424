//! Quill Server
//!
//! Self-hosted blogging API with tiered post visibility.
//! Posts are shared per audience: public readers, authenticated users,
//! the author's team, or the author alone.

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod posts;
