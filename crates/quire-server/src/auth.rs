use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

use crate::error::{ServerError, ServerResult};

/// Who a request was made by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    /// The single producer allowed to publish and delete.
    Producer,
    Anonymous,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read an `Authorization: Bearer …` header, if present.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| Self::Bearer(token.trim().to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

/// Accepts exactly one configured bearer token.
pub struct StaticTokenAuth {
    token: String,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuth").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Bearer(token) if constant_time_eq(token, &self.token) => {
                Ok(Identity::Producer)
            }
            Credentials::Bearer(_) => Err(ServerError::Unauthorized),
            Credentials::Anonymous => Ok(Identity::Anonymous),
        }
    }
}

/// Compare two secrets without leaking the position of the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let len = a.len().max(b.len());
    let mut a_padded = vec![0u8; len];
    let mut b_padded = vec![0xFFu8; len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let same_len = a.len().ct_eq(&b.len());
    (same_len & a_padded.ct_eq(&b_padded)).into()
}

/// Fail unless the request carries the producer's credentials.
pub async fn require_producer(auth: &dyn AuthProvider, headers: &HeaderMap) -> ServerResult<()> {
    match auth.authenticate(&Credentials::from_headers(headers)).await? {
        Identity::Producer => Ok(()),
        Identity::Anonymous => Err(ServerError::Unauthorized),
    }
}
