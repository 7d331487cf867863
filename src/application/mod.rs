//! Application services: the rotation engine, catalog management, and their collaborators.

pub mod catalog;
pub mod error;
pub mod generator;
pub mod jobs;
pub mod publisher;
pub mod repos;
pub mod rotation;
pub mod seed;
