use std::sync::Arc;
use reqwest::{Request, Response, header::{AUTHORIZATION, HeaderValue}};
use reqwest_middleware::{Middleware, Next, Result};
use http::Extensions;

/// Adds `Authorization: Bearer <token>` to every request.
pub struct AuthHeaderMiddleware {
    pub token_fn: Arc<dyn Fn() -> Option<String> + Send + Sync>,
}

impl AuthHeaderMiddleware {
    pub fn with_token(token: String) -> Self {
        AuthHeaderMiddleware {
            token_fn: Arc::new(move || Some(token.clone())),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for AuthHeaderMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let token = (self.token_fn)();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                    "GITHUB_TOKEN contains characters not allowed in a header"
                ))
            })?;
            value.set_sensitive(true);
            req.headers_mut().insert(AUTHORIZATION, value);
        }
        next.run(req, extensions).await
    }
}
