//! Property and scenario test suite for drips lists.
//!
//! The integration tests under `tests/` drive both list types through
//! randomized operation sequences and compare them against a plain map
//! model, on the in-memory store and on RocksDB.

pub mod helpers;
