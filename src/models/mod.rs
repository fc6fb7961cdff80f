// src/models/mod.rs

pub mod dto;
pub mod flower;
pub mod question;
pub mod recommendation;
