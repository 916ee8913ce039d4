// src/utils/mod.rs

pub mod sample_bank;
