use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use anyhow::{Result, anyhow};
use env_logger::{Builder, Env, Target};

fn builder() -> Builder {
    Builder::from_env(Env::default().default_filter_or("info"))
}

/// Log to stderr; used by the one-shot commands
pub fn init_stderr() {
    builder().init();
}

/// The TUI owns the terminal, so its log goes to a file instead
pub fn init_file() -> Result<PathBuf> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    builder().target(Target::Pipe(Box::new(file))).init();
    Ok(path)
}

pub fn log_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;

    Ok(cache_dir.join("rag-chat").join("rag-chat.log"))
}
