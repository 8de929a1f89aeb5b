use std::sync::Arc;

use quiz_core::model::QuizRules;
use storage::repository::Storage;

use crate::Clock;
use crate::auth::CurrentUser;
use crate::dashboard_service::DashboardService;
use crate::sessions::QuizSessionService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz_sessions: Arc<QuizSessionService>,
    dashboard: Arc<DashboardService>,
}

impl AppServices {
    /// Build the services over an opened storage backend.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        rules: QuizRules,
        auth: Arc<dyn CurrentUser>,
    ) -> Self {
        let quiz_sessions = Arc::new(QuizSessionService::from_storage(
            clock,
            rules.clone(),
            auth,
            storage,
        ));
        let dashboard = Arc::new(DashboardService::new(
            clock,
            rules,
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.games),
        ));

        Self {
            quiz_sessions,
            dashboard,
        }
    }

    #[must_use]
    pub fn quiz_sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz_sessions)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}
