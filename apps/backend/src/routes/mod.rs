//! HTTP route handlers

pub mod auth;
pub mod lessons;
pub mod moderation;
pub mod study;
pub mod teacher;
pub mod users;
