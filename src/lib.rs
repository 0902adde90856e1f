//! Composer assistant for the status post field: markup formatting, link and
//! image templates, media upload and `@mention` autocomplete.

pub mod app;
pub mod config;
pub mod dom;
pub mod editor_core;
pub mod error;
pub mod format;
pub mod http;
pub mod logging;
pub mod lookup;
pub mod mention;
pub mod mention_list;
pub mod upload;
