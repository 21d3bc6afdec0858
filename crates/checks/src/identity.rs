//! Checker identity encoding and decoding.
//!
//! A checker registered by this system has a UUID of the form
//! `scheme:prefix-digest`, where `digest` is the lower-case hex SHA-256 of the
//! repository name. Encoding is deterministic, so registering the same
//! `(repository, prefix)` pair twice yields the same UUID and re-registration
//! is idempotent.
//!
//! Decoding recovers the handler prefix from a UUID. It is used both to filter
//! the checker list down to the checkers owned by this scheme and to route a
//! pending check to its handler.

use sha2::{Digest, Sha256};

use crate::{CheckerUuid, RepositoryName, Scheme};

/// Separates the scheme from the rest of the UUID.
pub const SCHEME_SEPARATOR: char = ':';

/// Separates the handler prefix from the repository digest.
pub const DIGEST_SEPARATOR: char = '-';

/// The identity of one checker registered by this system.
///
/// Immutable once created; [`CheckerIdentity::uuid`] renders the registered
/// form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckerIdentity {
    scheme: Scheme,
    prefix: String,
    repo_digest: Vec<u8>,
}

impl CheckerIdentity {
    /// The scheme that owns this checker.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// The handler prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The raw repository digest.
    pub fn repo_digest(&self) -> &[u8] {
        &self.repo_digest
    }

    /// Renders the identity as a registrable checker UUID.
    pub fn uuid(&self) -> CheckerUuid {
        // scheme is never empty, so the rendered string never is either.
        CheckerUuid::new(self.to_string()).unwrap_or_else(|| unreachable!())
    }
}

impl std::fmt::Display for CheckerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.scheme,
            SCHEME_SEPARATOR,
            self.prefix,
            DIGEST_SEPARATOR,
            hex::encode(&self.repo_digest)
        )
    }
}

/// Encodes and decodes checker identities for one scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCodec {
    scheme: Scheme,
}

impl IdentityCodec {
    /// Creates a codec for `scheme`.
    pub fn new(scheme: Scheme) -> Self {
        Self { scheme }
    }

    /// The scheme this codec encodes for.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Builds the identity of the checker for `prefix` on `repository`.
    pub fn encode(&self, repository: &RepositoryName, prefix: &str) -> CheckerIdentity {
        let digest = Sha256::digest(repository.as_str().as_bytes());
        CheckerIdentity {
            scheme: self.scheme.clone(),
            prefix: prefix.to_string(),
            repo_digest: digest.to_vec(),
        }
    }

    /// Extracts the handler prefix from a checker UUID.
    ///
    /// Returns `None` unless the UUID starts with `scheme:` and the remainder
    /// splits on its last `-` into a non-empty prefix and a non-empty digest.
    pub fn decode<'a>(&self, uuid: &'a str) -> Option<&'a str> {
        let rest = uuid
            .strip_prefix(self.scheme.as_str())
            .and_then(|r| r.strip_prefix(SCHEME_SEPARATOR));

        // Split even without the scheme so malformed UUIDs are reported the
        // same way; ownership is still required for success.
        let (prefix, digest) = rest.unwrap_or(uuid).rsplit_once(DIGEST_SEPARATOR)?;
        if rest.is_none() || prefix.is_empty() || digest.is_empty() {
            return None;
        }
        Some(prefix)
    }

    /// Returns `true` if `uuid` is a well-formed checker UUID of this scheme.
    pub fn owns(&self, uuid: &str) -> bool {
        self.decode(uuid).is_some()
    }
}
