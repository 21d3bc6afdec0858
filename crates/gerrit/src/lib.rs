//! Gerrit adapter for the review-service port.
//!
//! [`GerritClient`] implements [`checks::ReviewService`] over the Gerrit REST
//! API and its checks plugin. Authentication is HTTP Basic, read from a
//! `user:password` file by [`BasicAuth::from_file`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`auth`] | Credentials file loading |
//! | [`client`] | URL building, request sending, startup probe |
//! | [`wire`] | JSON prefix handling, timestamps, wire structs |
//! | `service` | The `ReviewService` implementation |

pub mod auth;
pub mod client;
mod service;
pub mod wire;

pub use auth::{BasicAuth, CredentialsError};
pub use client::{ClientError, GerritClient, GerritSettings, LockStyle};
