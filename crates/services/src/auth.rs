use async_trait::async_trait;
use quiz_core::model::UserId;

/// Source of the signed-in user, backed by whatever auth provider the app uses.
#[async_trait]
pub trait CurrentUser: Send + Sync {
    async fn current_user(&self) -> Option<UserId>;
}

/// Fixed identity, e.g. from a command-line flag or a test.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticUser(Option<UserId>);

impl StaticUser {
    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self(Some(user))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl CurrentUser for StaticUser {
    async fn current_user(&self) -> Option<UserId> {
        self.0
    }
}
