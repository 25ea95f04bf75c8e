use crate::errors::{DispatchError, DispatchResult};

/// The identity provider's view of the current user, handed to every submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// The provider has not finished loading; nothing can be submitted yet.
    Pending,
    Anonymous,
    Authenticated { token: String },
}

impl Session {
    pub fn authenticated<S: Into<String>>(token: S) -> Self {
        Session::Authenticated {
            token: token.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Session::Pending)
    }

    /// The bearer token, if there is a non-empty one.
    pub fn credential(&self) -> Option<&str> {
        match self {
            Session::Authenticated { token } if !token.is_empty() => Some(token),
            _ => None,
        }
    }

    /// Resolve the credential to send, applying the credential policy.
    pub fn resolve(&self, require_credential: bool) -> DispatchResult<Option<&str>> {
        if self.is_pending() {
            return Err(DispatchError::Auth(
                "Please wait for session to load.".to_string(),
            ));
        }
        match self.credential() {
            None if require_credential => Err(DispatchError::Auth(
                "Authentication required. Please log in.".to_string(),
            )),
            credential => Ok(credential),
        }
    }
}

impl From<Option<String>> for Session {
    fn from(token: Option<String>) -> Self {
        match token {
            Some(token) => Session::Authenticated { token },
            None => Session::Anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_no_credential() {
        let session = Session::authenticated("");
        assert_eq!(session.credential(), None);
        assert!(matches!(session.resolve(true), Err(DispatchError::Auth(_))));
        assert_eq!(session.resolve(false), Ok(None));
    }

    #[test]
    fn test_pending_is_never_submittable() {
        let err = tokio_test::assert_err!(Session::Pending.resolve(false));
        assert_eq!(err.kind(), "auth");
    }

    #[test]
    fn test_resolve_token() {
        let session = Session::from(Some("tok".to_string()));
        assert_eq!(tokio_test::assert_ok!(session.resolve(true)), Some("tok"));
        assert_eq!(Session::from(None).resolve(false), Ok(None));
    }
}
