use serde::Serialize;
use std::fmt;

/// HTTP-equivalent status attached to every orchestrator result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const BAD_REQUEST: Self = Self(400);
    pub const NOT_FOUND: Self = Self(404);
    pub const REQUEST_TIMEOUT: Self = Self(408);
    pub const CONFLICT: Self = Self(409);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    pub fn from_u16(code: u16) -> Self {
        Self(code)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A successful orchestrator result: the status and the payload the edge serializes.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub status: StatusCode,
    pub payload: T,
}

impl<T> Outcome<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            status: StatusCode::OK,
            payload,
        }
    }

    pub fn created(payload: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            payload,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            status: self.status,
            payload: f(self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(StatusCode::CREATED.is_success());
        assert!(!StatusCode::CREATED.is_client_error());
        assert!(StatusCode::CONFLICT.is_client_error());
        assert!(!StatusCode::INTERNAL_SERVER_ERROR.is_client_error());
        assert_eq!(StatusCode::from_u16(502).to_string(), "502");
    }

    #[test]
    fn test_outcome_map_keeps_status() {
        let outcome = Outcome::created(1u64).map(|id| id + 1);
        assert_eq!(outcome.status, StatusCode::CREATED);
        assert_eq!(outcome.payload, 2);
    }
}
