pub mod config;
pub mod document;
pub mod export;
pub mod history;
pub mod init;
