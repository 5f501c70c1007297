//! Cardbox Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Flashcard`, `TopicShell`, `ColorMapping`, `BoxSet`,
//!   `SaveOperation`, `RemoteRecord`
//! - **Port definitions** - Traits for adapters: `RecordStore`, `AccessTokenProvider`
//! - **Configuration** - Typed config loaded from YAML
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no network or I/O
//! dependencies. Ports define trait interfaces that adapter crates implement.
//! The save queue and message router orchestrate domain entities through the
//! port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
