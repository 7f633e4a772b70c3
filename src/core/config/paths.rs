use std::env;
use std::fs;
use std::path::PathBuf;

/// Filesystem layout for the pipeline.
///
/// Everything lives under a single data root: raw documents go in `raw/`,
/// the persisted vector collection in `index/`, logs in `logs/`.
/// `processed/` is reserved for intermediate artifacts and is currently
/// unused by the ingestion flow.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub index_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        Self::with_data_dir(discover_data_dir())
    }

    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let raw_dir = data_dir.join("raw");
        let processed_dir = data_dir.join("processed");
        let index_dir = data_dir.join("index");
        let log_dir = data_dir.join("logs");

        for dir in [&data_dir, &raw_dir, &processed_dir, &index_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            data_dir,
            raw_dir,
            processed_dir,
            index_dir,
            log_dir,
        }
    }

    /// Path of the persisted collection database.
    pub fn collection_db(&self, collection_name: &str) -> PathBuf {
        self.index_dir.join(format!("{}.db", collection_name))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("ASKDOCS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("data")
}
