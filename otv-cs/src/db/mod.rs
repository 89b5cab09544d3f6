//! Database access for the catalog service

pub mod catalog;
