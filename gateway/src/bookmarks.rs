//! Bookmarked locations
//!
//! Storage sits behind `BookmarkStore` so a persistent backend can be
//! swapped in without touching the handlers. The default store lives
//! for the process lifetime only.

use std::sync::RwLock;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
}

/// Append/list seam for bookmark persistence
pub trait BookmarkStore: Send + Sync {
    fn append(&self, bookmark: Bookmark);
    /// All bookmarks in insertion order
    fn list(&self) -> Vec<Bookmark>;
}

/// Process-lifetime store
pub struct InMemoryBookmarks {
    entries: RwLock<Vec<Bookmark>>,
}

impl InMemoryBookmarks {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryBookmarks {
    fn default() -> Self {
        Self::new()
    }
}

impl BookmarkStore for InMemoryBookmarks {
    fn append(&self, bookmark: Bookmark) {
        self.entries
            .write()
            .expect("bookmark store poisoned")
            .push(bookmark);
    }

    fn list(&self) -> Vec<Bookmark> {
        self.entries
            .read()
            .expect("bookmark store poisoned")
            .clone()
    }
}

#[derive(Deserialize)]
pub struct BookmarkRequest {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

pub async fn list_bookmarks(State(state): State<AppState>) -> Json<Vec<Bookmark>> {
    Json(state.bookmarks.list())
}

pub async fn add_bookmark(
    State(state): State<AppState>,
    Json(req): Json<BookmarkRequest>,
) -> Json<Bookmark> {
    let bookmark = Bookmark {
        id: Uuid::new_v4(),
        name: req.name,
        lat: req.lat,
        lon: req.lon,
        timestamp: Utc::now(),
    };
    state.bookmarks.append(bookmark.clone());
    Json(bookmark)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(name: &str) -> Bookmark {
        Bookmark {
            id: Uuid::new_v4(),
            name: name.to_string(),
            lat: 51.92,
            lon: 4.48,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_append_then_list_preserves_order() {
        let store = InMemoryBookmarks::new();
        store.append(bookmark("home"));
        store.append(bookmark("office"));
        store.append(bookmark("levee"));

        let names: Vec<_> = store.list().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["home", "office", "levee"]);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let store = InMemoryBookmarks::new();
        store.append(bookmark("one"));

        let snapshot = store.list();
        store.append(bookmark("two"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.list().len(), 2);
    }
}
