pub mod cli;
pub mod email;
pub mod gemini;
pub mod load_config;
pub mod ollama;
pub mod telegraph;

pub use cli::{run, Cli, Commands};
