//! Mood catalog and the in-memory collection of classified tracks

mod catalog;
mod store;

pub use catalog::{Mood, UnknownMood};
pub use store::MoodStore;
