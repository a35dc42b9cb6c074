//! Enlisted - serve in a lord's party as an invisible follower
//!
//! The player's party is hidden, glued to the leader's position and pushed
//! into the leader's battles, while every host pathway that could expose it
//! is intercepted.

pub mod campaign;
pub mod core;
pub mod escort;
pub mod host;
pub mod services;
