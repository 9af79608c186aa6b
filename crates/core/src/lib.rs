#![deny(warnings)]

pub mod analysis;
pub mod config;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod tone;
pub mod tts;
