use async_trait::async_trait;

/// Called by the HTTP client whenever the backend answers 401, regardless of
/// which store issued the request.
#[async_trait]
pub trait SessionInvalidator: Send + Sync {
    async fn invalidate(&self);
}

pub type InvalidatorBox = std::sync::Arc<dyn SessionInvalidator>;
