//! Utility functions for the engine

pub mod file;
pub mod retry;
pub mod string;
