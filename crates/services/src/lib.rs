#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod dashboard_service;
pub mod error;
pub mod events;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use auth::{CurrentUser, StaticUser};
pub use dashboard_service::{DashboardOverview, DashboardService, HISTORY_LIMIT};
pub use error::SessionError;
pub use events::{ChannelSink, QuizEventSink, RecordingSink, TracingSink};
pub use sessions::{FinishReport, PersistenceStatus, QuizSession, QuizSessionService, run_quiz};
