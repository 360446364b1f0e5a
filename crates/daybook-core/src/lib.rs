//! Core abstractions for Daybook: the task model, the task store with its
//! daily reset policy, the view projection, and the key-value storage contract.
//! This crate stays free of terminal and filesystem concerns.

pub mod clock;
pub mod edit;
pub mod reset;
pub mod storage;
pub mod store;
pub mod tasks;
pub mod view;
