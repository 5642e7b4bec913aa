pub mod api_client;
pub mod constants;
pub mod errors;
pub mod middleware;

pub use api_client::{ApiClient, ApiClientBuilder};
pub use errors::ClientError;
pub use middleware::{
    BearerAuth, NotifyCallback, RequestContext, RequestStage, ResponseStage,
    SessionExpiredCallback, UnauthorizedHandler,
};
