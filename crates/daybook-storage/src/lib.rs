//! Durable storage implementations for Daybook.
//! Values live as files under a data directory, written atomically.

pub mod file_store;
