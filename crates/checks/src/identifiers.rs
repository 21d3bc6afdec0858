//! Newtype domain identifiers.
//!
//! Every review-service concept that has an identity is represented as a
//! distinct newtype wrapping a primitive. This prevents accidentally
//! interchanging a [`ChangeNumber`] with a [`PatchSetId`] even though both are
//! integers under the hood, or a [`RepositoryName`] with a [`CheckerUuid`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (review-service-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Integer-backed identifiers
// ---------------------------------------------------------------------------

u64_id! {
    /// The numeric identifier of a change (Gerrit's `_number`).
    ChangeNumber
}

u64_id! {
    /// The number of a patch set (revision) within a change.
    PatchSetId
}

// ---------------------------------------------------------------------------
// String-backed identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// The namespace that identifies which external system owns a checker
    /// UUID (e.g. `"jarvis"`).
    Scheme
}

string_id! {
    /// A repository (Gerrit project) name, e.g. `"platform/airship"`.
    RepositoryName
}

string_id! {
    /// A checker UUID as registered with the review service
    /// (`scheme:prefix-digest`).
    ///
    /// This is the raw registered string; use
    /// [`crate::IdentityCodec::decode`] to extract the handler prefix.
    CheckerUuid
}

string_id! {
    /// A change as addressed by the change REST endpoints: Gerrit's `id`,
    /// the `project~branch~Change-Id` triplet with the project URL-encoded
    /// (e.g. `"platform%2Fairship~master~I0123"`).
    ///
    /// The value is already URL-safe and goes into request paths verbatim.
    ChangeId
}
