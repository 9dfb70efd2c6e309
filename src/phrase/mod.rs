//! Phrase matching for wake/sleep word detection
//!
//! Recognized text is canonicalized by [`normalize`] before being tested
//! against a [`PhraseMatcher`] compiled from the configured phrase lists.

mod matcher;
mod normalize;

pub use matcher::PhraseMatcher;
pub use normalize::normalize;
