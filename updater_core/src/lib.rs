pub mod config;
pub mod downloader;
pub mod installer;
pub mod notification;
pub mod platform;
pub mod service;
pub mod session;
pub mod types;
