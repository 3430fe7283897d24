pub mod environment;
pub mod global_file;
pub mod settings_file;
