//! api
//!
//! The HTTP boundary: the [`HttpClient`] capability, the normalized
//! [`ApiError`], a `reqwest` implementation and a scripted mock.
//!
//! # Implementations
//!
//! - [`ReqwestHttp`]: real client with timeout and bearer authentication
//! - [`mock::MockHttp`]: deterministic double for tests

mod errors;
mod http;
pub mod mock;
mod traits;

pub use errors::{ApiError, ErrorCode};
pub use http::{ReqwestHttp, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use traits::{decode_body, encode_body, HttpClient, HttpMethod};
