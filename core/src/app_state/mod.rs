pub mod favorites;

pub use favorites::{FavoritesStore, MemoryFavoritesStore};

use crate::feed_interface::Flight;
use crate::telemetry::LogManager;

/// Application state shared by the list, detail and favorites views.
///
/// Owned by the application shell and handed to whoever needs it; there is
/// no process-wide instance.
pub struct AppState<S: FavoritesStore> {
    favorites: Vec<Flight>,
    store: S,
    logger: LogManager,
}

impl<S: FavoritesStore> AppState<S> {
    /// Loads persisted favorites; an unreadable store starts out empty.
    pub fn new(store: S) -> Self {
        let logger = LogManager::new("spotcore::favorites");
        let favorites = store.load().unwrap_or_else(|e| {
            logger.warn(&format!("could not load favorites: {}", e));
            Vec::new()
        });

        Self {
            favorites,
            store,
            logger,
        }
    }

    pub fn favorites(&self) -> &[Flight] {
        &self.favorites
    }

    pub fn is_favorite(&self, flight: &Flight) -> bool {
        self.favorites.iter().any(|f| f.same_flight(flight))
    }

    /// Adds or removes `flight` and persists the result. Returns whether the
    /// flight is a favorite afterwards.
    pub fn toggle_favorite(&mut self, flight: &Flight) -> bool {
        let now_favorite = if self.is_favorite(flight) {
            self.favorites.retain(|f| !f.same_flight(flight));
            false
        } else {
            self.favorites.push(flight.clone());
            true
        };

        if let Err(e) = self.store.save(&self.favorites) {
            self.logger.warn(&format!("could not save favorites: {}", e));
        }
        now_favorite
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
