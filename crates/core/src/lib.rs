#![deny(warnings)]

pub mod asr;
pub mod chat;
pub mod config;
pub mod coping;
pub mod playback;
pub mod resources;
pub mod sentiment;
pub mod session;
pub mod tts;
