pub mod config;
pub mod device;
pub mod host;
pub mod init;
pub mod send;
pub mod sequence;
