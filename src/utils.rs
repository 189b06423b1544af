use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "air_quality_rs_cache";

pub fn get_cache_dir() -> io::Result<PathBuf> {
    dirs::cache_dir()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system cache directory",
            )
        })
        .map(|p| p.join(CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Cache path exists but is not a directory: {}", path.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}
