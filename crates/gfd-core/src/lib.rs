//! # gfd-core
//!
//! Core types, grid validation, and robot simulation for Game for Devs.
//!
//! This crate provides the foundational types shared across all gfd crates:
//! - Entity structs for tracks, admin users, game sessions, and audit entries
//! - Status enums with the game session state machine
//! - The 4x5 track grid and the robot program simulator
//! - Track import/export documents
//! - Paging primitives and statistics DTOs
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod grid;
pub mod paging;
pub mod robot;
pub mod stats;
pub mod transfer;
