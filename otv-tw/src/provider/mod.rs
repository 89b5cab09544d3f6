//! External translation provider clients

pub mod deepl;

pub use deepl::{DeepLClient, TranslationProvider};
