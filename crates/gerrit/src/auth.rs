//! HTTP Basic credentials read from a `user:password` file.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures loading the credentials file.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("reading credentials from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credentials in {} are not of the form user:password", path.display())]
    Malformed { path: PathBuf },
}

/// Basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    user: String,
    password: String,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Loads credentials from a file whose (whitespace-trimmed) content is
    /// `user:password`. The password may itself contain `:`.
    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(content.trim()).ok_or_else(|| CredentialsError::Malformed {
            path: path.to_path_buf(),
        })
    }

    fn parse(value: &str) -> Option<Self> {
        let (user, password) = value.split_once(':')?;
        if user.is_empty() {
            return None;
        }
        Some(Self::new(user, password))
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

// The password never reaches logs.
impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_trimmed_user_and_password() {
        let file = write_file("jarvis:s3cr:et\n");

        let auth = BasicAuth::from_file(file.path()).unwrap();

        assert_eq!(auth.user(), "jarvis");
        assert_eq!(auth.password(), "s3cr:et");
    }

    #[test]
    fn missing_separator_is_malformed() {
        let file = write_file("jarvis");

        let err = BasicAuth::from_file(file.path()).unwrap_err();

        assert!(matches!(err, CredentialsError::Malformed { .. }));
    }

    #[test]
    fn empty_user_is_malformed() {
        let file = write_file(":password");

        assert!(matches!(
            BasicAuth::from_file(file.path()),
            Err(CredentialsError::Malformed { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = BasicAuth::from_file(&dir.path().join("absent")).unwrap_err();

        assert!(matches!(err, CredentialsError::Read { .. }));
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", BasicAuth::new("jarvis", "hunter2"));

        assert!(rendered.contains("jarvis"));
        assert!(!rendered.contains("hunter2"));
    }
}
