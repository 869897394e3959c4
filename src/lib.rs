pub mod candidates;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod domain_utils;
pub mod entity;
pub mod export;
pub mod extract;
pub mod links;
pub mod logger;
pub mod pipeline;
pub mod probe;

pub use checkpoint::{Checkpoint, ResumeMode};
pub use entity::{Entity, EntityCategory, EntityResult, ManualResearchItem, ResolutionStatus};
