pub mod catalog;
pub mod config;
pub mod error;
pub mod images;
pub mod outputs;
pub mod pipeline;
pub mod source;
pub mod timebucket;
