//! Business services

pub mod recorder;
pub mod study;
