// src/handlers/mod.rs

pub mod auth;
pub mod category;
pub mod comment;
pub mod genre;
pub mod review;
pub mod title;
pub mod user;
