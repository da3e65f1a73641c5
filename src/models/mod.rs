//! Core data models for the score keeper.

mod message;
mod participants;
mod record;

pub use message::*;
pub use participants::*;
pub use record::*;
