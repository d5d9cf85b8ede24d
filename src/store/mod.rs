pub mod repo;
pub mod tasks;
