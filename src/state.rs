/// Where a session stands in its login/logout lifecycle.
///
/// `owned` is true only when this process performed the login, and so is the
/// one that has to log out again.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated { token: String, owned: bool },
    Released,
}

impl AuthState {
    pub fn token(&self) -> Option<&str> {
        match self {
            AuthState::Authenticated { token, .. } => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, AuthState::Authenticated { owned: true, .. })
    }

    /// Moves to `Released`, handing back the token if a logout is still owed.
    pub fn release(&mut self) -> Option<String> {
        match std::mem::replace(self, AuthState::Released) {
            AuthState::Authenticated { token, owned: true } => Some(token),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Unauthenticated => f.write_str("Unauthenticated"),
            AuthState::Authenticated { owned, .. } => f
                .debug_struct("Authenticated")
                .field("token", &"<redacted>")
                .field("owned", owned)
                .finish(),
            AuthState::Released => f.write_str("Released"),
        }
    }
}
