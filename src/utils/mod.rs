// src/utils/mod.rs
pub mod constants;
pub mod general;
pub mod rdconfig;
