pub mod config;
pub mod ecs;
pub mod ident;
pub mod world;
