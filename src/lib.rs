//! furigana-rs - reading and translation gateway for Japanese learners
//!
//! Annotates Japanese sentences with furigana, Korean pronunciation and
//! cumulative translations through an LLM, proxies speech synthesis, and
//! drives the word-by-word reveal shown during playback.

pub mod config;
pub mod error;
pub mod gateway;
pub mod ingest;
pub mod library;
pub mod llm;
pub mod playback;
pub mod prompt;
pub mod renderer;
pub mod segment;
pub mod server;
pub mod session;
pub mod store;
pub mod tts;
