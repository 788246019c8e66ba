//! Persistence for the lesson catalog, lesson content, and learner progress.

#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;
