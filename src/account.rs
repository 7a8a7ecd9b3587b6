use anyhow::Result;

use crate::auth::{AuthService, Authenticator, Role, Session};
use crate::error::AuthError;
use crate::model::{PredictionInput, PredictionResult};
use crate::store::{Message, NewPrediction, StoredPrediction};
use crate::weather::WeatherData;

/// Operations available to any signed-in user.
pub struct Account<'a> {
    auth: &'a AuthService,
    session: Session,
}

impl<'a> Account<'a> {
    pub fn open(auth: &'a AuthService, session: Session) -> Result<Self, AuthError> {
        if !auth.require_role(&session, Role::User) {
            return Err(AuthError::SessionExpired);
        }
        Ok(Self { auth, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn save_prediction(
        &self,
        input: &PredictionInput,
        result: &PredictionResult,
        weather: Option<&WeatherData>,
    ) -> Result<StoredPrediction> {
        self.auth.store().create_prediction(NewPrediction {
            user_id: Some(self.session.user_id),
            input,
            result,
            weather,
        })
    }

    pub fn predictions(&self) -> Result<Vec<StoredPrediction>> {
        self.auth.store().user_predictions(self.session.user_id)
    }

    /// Posts a message to the admins.
    pub fn send_message(&self, content: &str) -> Result<Message, AuthError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AuthError::Validation("message cannot be empty".to_string()));
        }
        Ok(self
            .auth
            .store()
            .create_message(self.session.user_id, content, false)?)
    }

    pub fn messages(&self) -> Result<Vec<Message>> {
        self.auth.store().user_messages(self.session.user_id)
    }

    /// Marks one of this user's messages as read.
    pub fn mark_read(&self, message_id: i64) -> Result<bool, AuthError> {
        let Some(message) = self.auth.store().message(message_id)? else {
            return Ok(false);
        };
        if message.user_id != self.session.user_id {
            return Err(AuthError::Forbidden("owner"));
        }
        Ok(self.auth.store().mark_message_read(message_id)?)
    }
}
