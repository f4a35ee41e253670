pub mod config;
pub mod database;
pub mod errors;
pub mod ingestor;
pub mod jobs;
pub mod models;
pub mod normalizer;
pub mod policy;
pub mod registry;
pub mod sources;
pub mod subtitles;
pub mod validators;
