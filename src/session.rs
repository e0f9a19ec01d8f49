use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::request::{Endpoint, Transport, TransportOptions};
use crate::state::AuthState;

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Password { user: String, password: String },
    Token(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Password { user, .. } => f
                .debug_struct("Password")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

#[derive(Serialize)]
struct LoginParams<'a> {
    user: &'a str,
    password: &'a str,
}

/// A session that has not been acquired yet.
pub struct Session {
    transport: Transport,
    credentials: Option<Credentials>,
    state: AuthState,
}

impl Session {
    pub fn new(
        endpoint: Endpoint,
        credentials: Option<Credentials>,
        options: &TransportOptions,
    ) -> Result<Self> {
        let transport = Transport::new(endpoint, options)?;
        let state = match &credentials {
            Some(Credentials::Token(token)) => AuthState::Authenticated {
                token: token.clone(),
                owned: false,
            },
            _ => AuthState::Unauthenticated,
        };

        Ok(Self {
            transport,
            credentials,
            state,
        })
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Logs in if needed and returns the scope in which API calls can be made.
    ///
    /// The returned [`ActiveSession`] logs out again when it is released or
    /// dropped, but only if the login happened here.
    pub fn acquire(self) -> Result<ActiveSession> {
        let Session {
            transport,
            credentials,
            state,
        } = self;

        if state.is_authenticated() {
            debug!("using externally supplied auth token");
            return Ok(ActiveSession { transport, state });
        }

        let (user, password) = match credentials {
            Some(Credentials::Password { user, password }) => (user, password),
            _ => {
                return Err(Error::Auth(
                    "no credentials given and no valid token file found".to_string(),
                ));
            }
        };

        let params = serde_json::to_value(LoginParams {
            user: &user,
            password: &password,
        })
        .map_err(|e| Error::invalid_response("user.login", e.to_string()))?;

        let result = transport
            .call("user.login", &params, None)
            .map_err(|e| match e {
                Error::Api { message, data, .. } => Error::Auth(match data {
                    Some(d) if !d.is_empty() => format!("login rejected: {message} ({d})"),
                    _ => format!("login rejected: {message}"),
                }),
                other => other,
            })?;

        let token = result
            .as_str()
            .ok_or_else(|| Error::invalid_response("user.login", "auth token is not a string"))?
            .to_string();

        info!(user = %user, endpoint = %transport.endpoint(), "logged in");

        Ok(ActiveSession {
            transport,
            state: AuthState::Authenticated { token, owned: true },
        })
    }
}

/// An authenticated session. Released exactly once, either through
/// [`ActiveSession::release`] or on drop.
pub struct ActiveSession {
    transport: Transport,
    state: AuthState,
}

impl ActiveSession {
    pub fn call(&self, method: &str, params: &Value) -> Result<Value> {
        self.transport.call(method, params, self.state.token())
    }

    pub fn is_owned(&self) -> bool {
        self.state.is_owned()
    }

    pub fn release(mut self) -> Result<()> {
        self.logout_if_owned()
    }

    fn logout_if_owned(&mut self) -> Result<()> {
        if matches!(self.state, AuthState::Authenticated { owned: false, .. }) {
            debug!("auth token supplied externally, not logging out");
        }
        let Some(token) = self.state.release() else {
            return Ok(());
        };

        self.transport.call("user.logout", &json!([]), Some(token.as_str()))?;
        info!(endpoint = %self.transport.endpoint(), "logged out");
        Ok(())
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if let Err(e) = self.logout_if_owned() {
            warn!("logout failed: {}", e);
        }
    }
}
