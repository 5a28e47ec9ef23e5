pub mod init;
pub mod listing;
pub mod message;
