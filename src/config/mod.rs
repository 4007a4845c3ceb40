pub mod env_file;
pub mod settings;

pub use env_file::*;
pub use settings::*;
