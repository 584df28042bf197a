pub mod backend;
pub mod campus;
pub mod error;
pub mod http;
pub mod types;

pub use backend::BackendClient;
pub use campus::CampusClient;
pub use error::ClientError;
pub use http::{HttpClient, HttpClientBuilder};
pub use types::{
    CacheEntry, CacheReceipt, HealthStatus, ModuleCompletion, ProgressSummary, Session,
    TokenRequest, TokenResponse,
};
