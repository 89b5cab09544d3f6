//! On-demand translation coordination for catalog reads

pub mod orchestrator;

pub use orchestrator::TranslationOrchestrator;
