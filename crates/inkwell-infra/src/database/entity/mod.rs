//! SeaORM entities. Foreign-key actions mirror the domain cascade rules.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;
