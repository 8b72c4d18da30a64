pub mod auth_middleware;
pub mod github_headers;
pub mod rate_limit_middleware;
