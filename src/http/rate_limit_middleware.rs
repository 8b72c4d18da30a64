use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use http::Extensions;
use log::{debug, warn};

/// Warn when this many requests or fewer remain in the current window.
const LOW_WATERMARK: u64 = 50;

/// Reads GitHub's `x-ratelimit-*` headers and logs when the budget runs low.
/// Requests are never delayed or retried here.
pub struct RateLimitMiddleware;

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait::async_trait]
impl Middleware for RateLimitMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let url = req.url().path().to_string();
        let response = next.run(req, extensions).await?;
        debug!("{} {} -> {}", method, url, response.status());

        if let Some(remaining) = header_u64(&response, "x-ratelimit-remaining") {
            let reset = header_u64(&response, "x-ratelimit-reset").unwrap_or_default();
            if remaining == 0 {
                warn!("GitHub rate limit exhausted, resets at unix time {}", reset);
            } else if remaining <= LOW_WATERMARK {
                warn!("GitHub rate limit low: {} requests left (reset at {})", remaining, reset);
            }
        }

        Ok(response)
    }
}
