// src/handlers/mod.rs

pub mod chat;
pub mod flowers;
pub mod quiz;
pub mod results;
pub mod session;
