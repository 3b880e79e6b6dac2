use crate::feed_interface::Flight;
use crate::prelude::{CoreError, CoreResult};
use std::sync::Mutex;

/// Persistence for favorite flights. The core only decides membership by
/// `Flight::id`; where and how the list is stored is up to the implementation.
pub trait FavoritesStore: Send {
    fn load(&self) -> CoreResult<Vec<Flight>>;
    fn save(&self, favorites: &[Flight]) -> CoreResult<()>;
}

/// Volatile store, used when persistence is disabled and in tests.
#[derive(Default)]
pub struct MemoryFavoritesStore {
    saved: Mutex<Vec<Flight>>,
}

impl MemoryFavoritesStore {
    pub fn with_favorites(favorites: Vec<Flight>) -> Self {
        Self {
            saved: Mutex::new(favorites),
        }
    }
}

impl FavoritesStore for MemoryFavoritesStore {
    fn load(&self) -> CoreResult<Vec<Flight>> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .map_err(|_| CoreError::Storage("favorites lock poisoned".into()))
    }

    fn save(&self, favorites: &[Flight]) -> CoreResult<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| CoreError::Storage("favorites lock poisoned".into()))?;
        *saved = favorites.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn poisoned_store_reports_storage_errors() {
        let store = MemoryFavoritesStore::default();
        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.saved.lock().unwrap();
            panic!("writer crashed");
        }));

        assert!(matches!(store.save(&[]), Err(CoreError::Storage(_))));
        assert!(matches!(store.load(), Err(CoreError::Storage(_))));
    }
}
