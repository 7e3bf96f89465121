//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep adapters (tool calls, HTTP, event streams) decoupled from storage.

pub mod workboard_service;
