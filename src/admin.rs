use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::auth::{AuthService, Authenticator, Role, Session};
use crate::error::AuthError;
use crate::prediction_export::{ExportReport, export_predictions};
use crate::store::{Message, StoredPrediction, User};

/// Admin-only operations. Construction checks the session's role.
pub struct AdminPanel<'a> {
    auth: &'a AuthService,
    session: Session,
}

impl<'a> AdminPanel<'a> {
    pub fn open(auth: &'a AuthService, session: Session) -> Result<Self, AuthError> {
        if !auth.require_role(&session, Role::Admin) {
            return Err(AuthError::Forbidden(Role::Admin.label()));
        }
        Ok(Self { auth, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn create_user(&self, username: &str, password: &str, is_admin: bool) -> Result<User, AuthError> {
        let user = self.auth.create_user(username, password, is_admin)?;
        info!(
            admin = self.session.username.as_str(),
            user = user.username.as_str(),
            is_admin,
            "admin created user"
        );
        Ok(user)
    }

    pub fn users(&self) -> Result<Vec<User>> {
        self.auth.store().all_users()
    }

    pub fn predictions(&self) -> Result<Vec<StoredPrediction>> {
        self.auth.store().all_predictions()
    }

    /// Replies in the conversation of `user_id`.
    pub fn send_message(&self, user_id: i64, content: &str) -> Result<Message, AuthError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AuthError::Validation("message cannot be empty".to_string()));
        }
        if self.auth.store().user_by_id(user_id)?.is_none() {
            return Err(AuthError::Validation(format!("no user with id {user_id}")));
        }
        Ok(self.auth.store().create_message(user_id, content, true)?)
    }

    pub fn messages(&self) -> Result<Vec<Message>> {
        self.auth.store().all_messages()
    }

    pub fn export_predictions(&self, path: &Path) -> Result<ExportReport> {
        let predictions = self.predictions()?;
        let users = self.users()?;
        let report = export_predictions(path, &predictions, &users)?;
        info!(
            path = %path.display(),
            predictions = report.predictions,
            "exported predictions"
        );
        Ok(report)
    }
}
