//! A library for watching a set of addresses on an Ethereum-compatible chain.
//!
//! The connector polls a JSON-RPC node for new blocks, filters every
//! transaction against a caller-maintained subscription set, and records the
//! matching transfers for later retrieval.
//!
//! # Key Components
//!
//! *   [`client`]: The [`client::ChainClient`] contract and its JSON-RPC implementation.
//! *   [`storage`]: The [`storage::Storage`] contract and its in-memory implementation.
//! *   [`scanner`]: The cursor-driven scan algorithm.
//! *   [`workers::ScanManager`]: The main entry point. It runs the background poll
//!     worker and hands out a [`workers::ScanHandle`] for subscribing and querying.

/// The chain client contract and the JSON-RPC implementation.
pub mod client;
/// Defines configuration structures for the connector.
pub mod config;
/// Addresses, transactions and block heights.
pub mod model;
/// Block-by-block scanning and filtering.
pub mod scanner;
/// A trait and default implementation for subscriptions and transaction logs.
pub mod storage;
/// The background worker that drives the scanner.
pub mod workers;
