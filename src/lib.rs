//! Studykeeper - Discord Study Companion
//!
//! This crate implements a study-companion Discord bot: per-user focus
//! sessions with looping background audio, a JSON-backed study planner,
//! and LLM-backed companion chat and quiz generation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
