pub mod paths;

// Re-export commonly used functions
pub use paths::{default_database_path, tempora_data_dir, tempora_home};
