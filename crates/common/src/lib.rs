//! Shared configuration, error handling, connection setup and domain types.

pub mod config;
pub mod db;
pub mod error;
pub mod types;
