//! API layer - HTTP entry points for the player client.

pub mod dto;
pub mod http;
