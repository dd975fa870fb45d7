//! API handlers module

pub mod crud;
pub mod health;
