use spotcore::app_state::FavoritesStore;
use spotcore::feed_interface::Flight;
use spotcore::{CoreError, CoreResult};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Favorites persisted as a JSON array of flights.
pub struct JsonFileFavoritesStore {
    path: PathBuf,
}

impl JsonFileFavoritesStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl FavoritesStore for JsonFileFavoritesStore {
    fn load(&self) -> CoreResult<Vec<Flight>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CoreError::Storage(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        serde_json::from_slice(&contents)
            .map_err(|e| CoreError::Storage(format!("parsing {}: {}", self.path.display(), e)))
    }

    fn save(&self, favorites: &[Flight]) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoreError::Storage(e.to_string()))?;
        }
        let body = serde_json::to_vec_pretty(favorites)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        fs::write(&self.path, body)
            .map_err(|e| CoreError::Storage(format!("writing {}: {}", self.path.display(), e)))
    }
}
