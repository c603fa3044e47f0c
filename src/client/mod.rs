pub mod api;
pub mod diagnostics;
pub mod error;
pub mod transport;

pub use api::{Endpoint, LedFxClient, Validation, DEFAULT_POST_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
pub use diagnostics::{DiagnosticEntry, DiagnosticsLog};
pub use error::{ClientError, ClientResult};
pub use transport::{is_mutating, BasicAuth, Method, ReqwestTransport, Request, Transport};
