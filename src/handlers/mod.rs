pub mod access;
pub mod commands;
