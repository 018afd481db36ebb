pub mod check;
pub mod config;
pub mod policies;
pub mod roles;
pub mod tree;
