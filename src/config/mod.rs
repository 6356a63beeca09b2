// Re-export all items from the submodules
mod env_vars;
mod settings;

// Re-export settings
pub use settings::{load_settings, CollectorSettings};

// Re-export environment variable functions
pub use env_vars::{expand_path, parse_unix_env_vars, parse_windows_env_vars, user_home_dir};
