pub mod composer;
pub mod config;
pub mod content_store;
pub mod data_uri;
pub mod draft;
pub mod error;
pub mod identity;
pub mod image_optimizer;
pub mod logger;
pub mod paginator;
pub mod post;
pub mod settings;
pub mod storage;
pub mod text_utils;
pub mod view;
