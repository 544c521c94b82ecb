//! Credential resolution for database connections

use std::fmt;

/// Authentication scheme presented to the database.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer { token: String },
    None,
}

impl Credentials {
    /// Pick the scheme from whatever was configured.
    ///
    /// Username and password together win over a bearer token, which wins
    /// over anonymous access. A username without a password (or the reverse)
    /// does not count as basic auth.
    pub fn resolve(
        username: Option<&str>,
        password: Option<&str>,
        bearer_token: Option<&str>,
    ) -> Self {
        match (username, password, bearer_token) {
            (Some(username), Some(password), _) => Self::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            (_, _, Some(token)) => Self::Bearer {
                token: token.to_string(),
            },
            _ => Self::None,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::None => "none",
        }
    }
}

// Secrets never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            Self::None => f.write_str("None"),
        }
    }
}
