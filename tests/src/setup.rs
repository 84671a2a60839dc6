//! Test environment setup.

use axum::Router;

use api::{router, AppState};
use insight::ClassifierConfig;

/// Shared test context: application state plus a ready router.
pub struct TestContext {
    pub state: AppState,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let state = AppState::new(ClassifierConfig::default());
        let router = router(state.clone());
        Self { state, router }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
