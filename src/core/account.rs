//! Account manager: auth state tracking and change notifications.
//!
//! Wraps the auth provider with a cached current user and a listener
//! registry. Every state change (sign-in, sign-up, sign-out, account
//! deletion, refresh that observes a change) fans out to subscribers;
//! dropping the returned subscription unsubscribes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, instrument};

use crate::domain::User;
use crate::providers::{AuthError, AuthProvider};

/// Callback invoked with the new auth state on every change
pub type AuthListener = Box<dyn Fn(Option<&User>) + Send + Sync>;

type ListenerMap = Arc<Mutex<HashMap<u64, AuthListener>>>;

/// Tracks the signed-in user and notifies subscribers on changes.
pub struct AccountManager {
    provider: Arc<dyn AuthProvider>,
    current: Mutex<Option<User>>,
    listeners: ListenerMap,
    next_listener_id: AtomicU64,
}

impl AccountManager {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            current: Mutex::new(None),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// The last observed user, without a provider round trip
    pub fn cached_user(&self) -> Option<User> {
        self.current.lock().expect("auth state poisoned").clone()
    }

    /// Register a state-change listener. The listener fires on every
    /// subsequent change until the subscription is dropped.
    pub fn subscribe(&self, listener: AuthListener) -> AuthSubscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .lock()
            .expect("listeners poisoned")
            .insert(id, listener);

        AuthSubscription {
            id,
            listeners: Arc::clone(&self.listeners),
        }
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.provider.sign_in(email, password).await?;
        info!(email, "signed in");
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
    ) -> Result<User, AuthError> {
        let user = self.provider.sign_up(email, password, first_name).await?;
        info!(email, "signed up");
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        info!("signed out");
        self.set_user(None);
        Ok(())
    }

    /// Re-fetch the session user from the provider, updating the cache
    /// and notifying listeners when the state changed.
    pub async fn refresh(&self) -> Result<Option<User>, AuthError> {
        let user = self.provider.current_user().await?;

        let changed = {
            let current = self.current.lock().expect("auth state poisoned");
            current.as_ref().map(|u| u.id) != user.as_ref().map(|u| u.id)
        };
        if changed {
            self.set_user(user.clone());
        }

        Ok(user)
    }

    /// Delete the signed-in account. Fails with `NotSignedIn` when there
    /// is no session; auth state is unchanged on provider failure.
    #[instrument(skip(self))]
    pub async fn delete_account(&self) -> Result<(), AuthError> {
        let user = self.cached_user().ok_or(AuthError::NotSignedIn)?;

        self.provider.delete_user(user.id).await?;
        info!(user_id = %user.id, "account deleted");
        self.set_user(None);
        Ok(())
    }

    fn set_user(&self, user: Option<User>) {
        *self.current.lock().expect("auth state poisoned") = user.clone();

        let listeners = self.listeners.lock().expect("listeners poisoned");
        for listener in listeners.values() {
            listener(user.as_ref());
        }
    }
}

/// Guard for a registered listener; dropping it unsubscribes.
pub struct AuthSubscription {
    id: u64,
    listeners: ListenerMap,
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.listeners
            .lock()
            .expect("listeners poisoned")
            .remove(&self.id);
    }
}
