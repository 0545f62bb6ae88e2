//! Domain models for the shelter system.

pub mod animal;
pub mod announcement;
pub mod comment;
pub mod feed;
pub mod group;
pub mod maintenance;
pub mod skill_tag;
pub mod stats;
pub mod user;
