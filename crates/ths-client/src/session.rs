//! # Session
//!
//! Who is logged in, and the bearer token that proves it.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login(email, password)                                                 │
//! │     │                                                                   │
//! │     ├── validate_email()                 invalid → Err, no request      │
//! │     ├── POST /login ──► token            rejected → Err                 │
//! │     ├── api.set_token(token), cache "token"                             │
//! │     ├── GET /users ──► cache "users"                                    │
//! │     └── find by email ──► cache "user"   missing → UserNotFound,        │
//! │                                          token dropped again            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A new `Session` resumes from the cache, so a restart keeps the cashier
//! logged in.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

use ths_core::validation::validate_email;
use ths_core::{User, ValidationError};

use crate::cache::keys;
use crate::error::{ClientError, ClientResult};
use crate::stores::{Loading, Services};

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
    users: Vec<User>,
}

pub struct Session {
    services: Services,
    state: RwLock<SessionState>,
    loading: Loading,
}

impl Session {
    /// Restores the last session from the cache.
    pub fn resume(services: Services) -> Self {
        let token: Option<String> = services.restore(keys::TOKEN);
        let user: Option<User> = services.restore(keys::USER);
        let users: Vec<User> = services.restore(keys::USERS).unwrap_or_default();

        if token.is_some() {
            services.api.set_token(token.clone());
        }
        debug!(
            user = ?user.as_ref().map(|u| u.id),
            has_token = token.is_some(),
            "Session resumed"
        );

        Self {
            services,
            state: RwLock::new(SessionState { token, user, users }),
            loading: Loading::default(),
        }
    }

    /// True while a login or user-list request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(ValidationError::Required {
                field: "password".to_string(),
            }
            .into());
        }

        let _loading = self.loading.start();
        let response = self.services.api.login(&email, password).await?;
        self.services.api.set_token(Some(response.token.clone()));
        self.services.persist(keys::TOKEN, &response.token);
        self.write().token = Some(response.token);

        let users = match self.fetch_users().await {
            Ok(users) => users,
            Err(e) => {
                self.drop_credentials();
                return Err(e);
            }
        };

        let Some(user) = users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(&email))
        else {
            warn!(email = %email, "Authenticated account missing from user list");
            self.drop_credentials();
            return Err(ClientError::UserNotFound(email));
        };

        self.services.persist(keys::USER, &user);
        self.write().user = Some(user.clone());
        info!(user_id = user.id, "Logged in");
        Ok(user)
    }

    /// Clears the token and the current user, locally and in the cache.
    pub fn logout(&self) {
        self.drop_credentials();
        self.write().user = None;
        self.services.forget(keys::USER);
        info!("Logged out");
    }

    fn drop_credentials(&self) {
        self.services.api.set_token(None);
        self.services.forget(keys::TOKEN);
        self.write().token = None;
    }

    /// Refreshes the user list and mirrors it to the cache.
    pub async fn fetch_users(&self) -> ClientResult<Vec<User>> {
        let _loading = self.loading.start();
        let users = self.services.api.fetch_users().await?;
        self.services.persist(keys::USERS, &users);
        self.write().users = users.clone();
        Ok(users)
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.read().user.as_ref().map(|u| u.id)
    }

    pub fn users(&self) -> Vec<User> {
        self.read().users.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.read();
        state.token.is_some() && state.user.is_some()
    }
}
