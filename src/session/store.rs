//! Session store controller

use crate::error::StoreError;
use crate::persist::StateStorage;
use crate::session::api::SessionApi;
use crate::session::state::{SessionSnapshot, SessionState, Theme, User};
use crate::store::{StateCell, Subscription};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Storage key for the persisted session subset.
pub const SESSION_STORAGE_KEY: &str = "session_store";

/// Owns authentication identity and the auth actions around it.
pub struct SessionStore<A, P>
where
    A: SessionApi + 'static,
    P: StateStorage,
{
    api: Arc<A>,
    storage: P,
    cell: StateCell<SessionState>,
    /// Monotonic counter; a login/signup response commits only while
    /// its generation is still current.
    auth_generation: AtomicU64,
}

impl<A, P> SessionStore<A, P>
where
    A: SessionApi + 'static,
    P: StateStorage,
{
    pub fn new(api: A, storage: P) -> Self {
        Self {
            api: Arc::new(api),
            storage,
            cell: StateCell::new(SessionState::default()),
            auth_generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SessionState {
        self.cell.snapshot()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> Subscription<SessionState> {
        self.cell.subscribe(listener)
    }

    /// Load the persisted session subset. Loading/error flags stay
    /// untouched; an unreadable snapshot is discarded.
    pub async fn restore(&self) {
        match self.storage.load(SESSION_STORAGE_KEY).await {
            Ok(Some(value)) => match serde_json::from_value::<SessionSnapshot>(value) {
                Ok(snapshot) => {
                    self.cell.update(|s| {
                        s.is_authenticated = snapshot.user.is_some();
                        s.user = snapshot.user;
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Discarding unreadable session snapshot"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load persisted session"),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, StoreError> {
        validate_email(email)?;
        validate_password(password)?;

        tracing::info!(email = %email, "Signing in");
        let generation = self.begin_auth();
        match self.api.login(email, password).await {
            Ok(user) => self.commit_auth(generation, user).await,
            Err(err) => self.fail_auth(generation, err),
        }
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<User, StoreError> {
        validate_email(email)?;
        validate_password(password)?;
        validate_username(username)?;

        tracing::info!(email = %email, username = %username, "Creating account");
        let generation = self.begin_auth();
        match self.api.signup(email, password, username).await {
            Ok(user) => self.commit_auth(generation, user).await,
            Err(err) => self.fail_auth(generation, err),
        }
    }

    /// Clears the session locally and fires the server-side cookie
    /// invalidation without waiting on it.
    pub async fn logout(&self) {
        tracing::info!("Signing out");
        self.clear_session().await;

        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            if let Err(e) = api.logout().await {
                tracing::warn!(error = %e, "Server logout failed");
            }
        });
    }

    /// Re-validate the session cookie against the backend. Any failure
    /// or an explicit no-session answer clears the local session.
    pub async fn refresh_session(&self) {
        match self.api.current_session().await {
            Ok(Some(user)) => {
                self.cell.update(|s| {
                    s.user = Some(user);
                    s.is_authenticated = true;
                });
                self.persist().await;
            }
            Ok(None) => self.clear_session().await,
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed");
                self.clear_session().await;
            }
        }
    }

    /// Shallow-merge fields into the current user; no-op while logged out.
    pub async fn update_user(&self, update: UserUpdate) {
        let changed = self.cell.update(|s| {
            let Some(user) = s.user.as_mut() else {
                return false;
            };
            if let Some(email) = update.email {
                user.email = email;
            }
            if let Some(username) = update.username {
                user.username = username;
            }
            if let Some(wallet_address) = update.wallet_address {
                user.wallet_address = Some(wallet_address);
            }
            if let Some(avatar) = update.avatar {
                user.avatar = Some(avatar);
            }
            user.updated_at = Utc::now();
            true
        });
        if changed {
            self.persist().await;
        }
    }

    /// Shallow-merge preference fields; no-op while logged out.
    pub async fn update_preferences(&self, update: PreferencesUpdate) {
        let changed = self.cell.update(|s| {
            let Some(user) = s.user.as_mut() else {
                return false;
            };
            if let Some(theme) = update.theme {
                user.preferences.theme = theme;
            }
            if let Some(notifications) = update.notifications {
                user.preferences.notifications = notifications;
            }
            if let Some(language) = update.language {
                user.preferences.language = language;
            }
            if let Some(newsletter) = update.newsletter {
                user.preferences.newsletter = newsletter;
            }
            user.updated_at = Utc::now();
            true
        });
        if changed {
            self.persist().await;
        }
    }

    fn begin_auth(&self) -> u64 {
        let generation = self.auth_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cell.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        generation
    }

    async fn commit_auth(&self, generation: u64, user: User) -> Result<User, StoreError> {
        if self.auth_generation.load(Ordering::SeqCst) != generation {
            return Err(StoreError::cancelled(
                "Superseded by a newer sign-in attempt",
            ));
        }
        self.cell.update(|s| {
            s.user = Some(user.clone());
            s.is_authenticated = true;
            s.is_loading = false;
            s.error = None;
        });
        self.persist().await;
        Ok(user)
    }

    fn fail_auth(&self, generation: u64, err: StoreError) -> Result<User, StoreError> {
        if self.auth_generation.load(Ordering::SeqCst) != generation {
            return Err(StoreError::cancelled(
                "Superseded by a newer sign-in attempt",
            ));
        }
        self.cell.update(|s| {
            s.is_loading = false;
            s.error = Some(err.message.clone());
        });
        Err(err)
    }

    async fn clear_session(&self) {
        self.cell.update(|s| {
            s.user = None;
            s.is_authenticated = false;
            s.is_loading = false;
            s.error = None;
        });
        self.persist().await;
    }

    async fn persist(&self) {
        let snapshot = {
            let state = self.cell.snapshot();
            SessionSnapshot {
                is_authenticated: state.is_authenticated,
                user: state.user,
            }
        };
        match serde_json::to_value(&snapshot) {
            Ok(value) => {
                if let Err(e) = self.storage.save(SESSION_STORAGE_KEY, &value).await {
                    tracing::warn!(error = %e, "Failed to persist session state");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize session snapshot"),
        }
    }
}

/// Field updates applied as a shallow merge; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub wallet_address: Option<String>,
    pub avatar: Option<String>,
}

/// Preference updates applied as a shallow merge.
#[derive(Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub theme: Option<Theme>,
    pub notifications: Option<bool>,
    pub language: Option<String>,
    pub newsletter: Option<bool>,
}

fn validate_email(email: &str) -> Result<(), StoreError> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if valid {
        Ok(())
    } else {
        Err(StoreError::validation("Enter a valid email address"))
    }
}

fn validate_password(password: &str) -> Result<(), StoreError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());
    if password.len() >= 8 && has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        Err(StoreError::validation(
            "Password must be at least 8 characters with upper and lower case letters, a digit, and a symbol",
        ))
    }
}

fn validate_username(username: &str) -> Result<(), StoreError> {
    let valid =
        username.len() >= 3 && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::validation(
            "Username must be at least 3 characters (letters, digits, underscore)",
        ))
    }
}
