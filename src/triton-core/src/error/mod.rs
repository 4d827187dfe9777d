pub mod builder;
pub mod config;
pub mod encryption;
pub mod foundation;
pub mod fs;
pub mod input;
pub mod key;
pub mod profile;
pub mod structured_file;
pub mod unlock;
