// src/utils/mod.rs

pub mod confirmation;
pub mod extract;
pub mod jwt;
pub mod pagination;
