//! Application routes and the navigation seam

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Named screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Login,
    Bills,
    NewBill,
    Dashboard,
}

impl Route {
    /// Path of the screen
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Bills => "/bills",
            Route::NewBill => "/bills/new",
            Route::Dashboard => "/dashboard",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Injected `onNavigate`
pub trait Navigator: Send + Sync {
    fn on_navigate(&self, route: Route);
}

/// Navigator that keeps every requested route
///
/// Used where navigation is answered after the handler returns, such as an
/// HTTP redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes requested so far, oldest first
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Last requested route, clearing the record
    pub fn take_last(&self) -> Option<Route> {
        self.routes.lock().ok().and_then(|mut r| {
            let last = r.last().copied();
            r.clear();
            last
        })
    }
}

impl Navigator for RecordingNavigator {
    fn on_navigate(&self, route: Route) {
        log::debug!(target: "billed::navigation", "Navigate to {}", route);
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Bills.path(), "/bills");
        assert_eq!(Route::NewBill.to_string(), "/bills/new");
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        navigator.on_navigate(Route::NewBill);
        navigator.on_navigate(Route::Bills);
        assert_eq!(navigator.routes(), vec![Route::NewBill, Route::Bills]);
        assert_eq!(navigator.take_last(), Some(Route::Bills));
        assert!(navigator.routes().is_empty());
        assert_eq!(navigator.take_last(), None);
    }
}
