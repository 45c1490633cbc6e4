//! auth
//!
//! Session handling: the [`SessionProvider`] capability consumed by the HTTP
//! client (bearer token) and the resource service (owner resolution for
//! offline creates).
//!
//! Tokens are never logged or formatted into errors.

mod session;

pub use session::{
    subject_from_jwt, SessionProvider, StaticSession, StoredSession, AUTH_TOKEN_KEY,
    AUTH_USER_ID_KEY,
};
