//! Frontline - war resolution and NPC decision engine

pub mod core;
pub mod npc;
pub mod persistence;
pub mod service;
pub mod war;
