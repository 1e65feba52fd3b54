//! LifeQuest - Gamified Productivity Tracker Library
//!
//! This module exposes the progression engine and persistence reconciler
//! for testing and external use.

pub mod attributes;
pub mod constants;
pub mod document;
pub mod goals;
pub mod progression;
pub mod quest;
pub mod session;
pub mod store;
pub mod suggestions;
