use crate::config::{AdminConfig, RepoSlug};
use crate::core::store::{StoredFile, TextStore, VersionToken, WriteReceipt};
use crate::error::store::{Result, StoreError};
use crate::http::auth_middleware::AuthHeaderMiddleware;
use crate::http::github_headers::default_headers;
use crate::http::rate_limit_middleware::RateLimitMiddleware;
use crate::model::contents_response::{ContentCommitResponse, ContentFile, ContentWriteRequest, GithubErrorBody};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use url::Url;

/// Which call produced a non-success status; decides how 422 is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Read,
    Create,
    Update,
    Delete,
}

/// The GitHub contents API for one repository.
pub struct GithubContents {
    client: ClientWithMiddleware,
    api_url: String,
    repo: RepoSlug,
    branch: Option<String>,
}

impl GithubContents {
    pub fn new(config: &AdminConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers())
            .build()?;

        let client = ClientBuilder::new(client)
            .with(AuthHeaderMiddleware::with_token(config.credential.clone()))
            .with(RateLimitMiddleware)
            .build();

        Ok(GithubContents {
            client,
            api_url: config.api_url.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
        })
    }

    /// `{api}/repos/{owner}/{repo}/contents/{path}` with each path segment
    /// percent-encoded.
    fn contents_url(&self, path: &str) -> Result<Url> {
        contents_url(&self.api_url, &self.repo, path)
    }

    async fn fail(call: Call, path: &str, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GithubErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        classify_status(call, path, status, message)
    }
}

fn contents_url(api_url: &str, repo: &RepoSlug, path: &str) -> Result<Url> {
    let mut url = Url::parse(api_url).map_err(|e| StoreError::Config(format!("GITHUB_API_URL: {}", e)))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| StoreError::Config(format!("`{}` cannot be a base URL", api_url)))?;
        segments.pop_if_empty();
        segments.push("repos").push(&repo.owner).push(&repo.name).push("contents");
        for part in path.split('/').filter(|p| !p.is_empty()) {
            segments.push(part);
        }
    }
    Ok(url)
}

/// Maps a GitHub error status onto the store error kinds.
fn classify_status(call: Call, path: &str, status: StatusCode, message: String) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(path.to_string()),
        StatusCode::CONFLICT => StoreError::Conflict(path.to_string()),
        // 没带 sha 的 PUT 撞上已有文件时返回 422
        StatusCode::UNPROCESSABLE_ENTITY if call == Call::Create => StoreError::AlreadyExists(path.to_string()),
        StatusCode::UNPROCESSABLE_ENTITY if matches!(call, Call::Update | Call::Delete) => {
            StoreError::Conflict(path.to_string())
        }
        _ => StoreError::RemoteUnavailable {
            status: Some(status.as_u16()),
            message,
        },
    }
}

/// GitHub wraps base64 content at 60 columns.
fn decode_content(path: &str, content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| StoreError::InvalidResponse(format!("{}: bad base64 content: {}", path, e)))
}

/// Turns a contents GET body into the file bytes and blob sha.
fn parse_content_file(path: &str, body: &str) -> Result<StoredFile> {
    // 目录会返回数组
    let file: ContentFile = serde_json::from_str(body)
        .map_err(|_| StoreError::InvalidResponse(format!("{} is not a file", path)))?;
    if file.type_field != "file" {
        return Err(StoreError::InvalidResponse(format!("{} is a {}", path, file.type_field)));
    }

    // 超过 1 MB 的文件 encoding 为 "none"，content 为空
    let content = match (file.encoding.as_deref(), file.content.as_deref()) {
        (_, Some("") | None) if file.size == 0 => Vec::new(),
        (Some("base64"), Some(content)) => decode_content(path, content)?,
        (encoding, _) => {
            return Err(StoreError::InvalidResponse(format!(
                "{}: unsupported encoding {:?} ({} bytes)",
                path, encoding, file.size
            )));
        }
    };

    Ok(StoredFile {
        content,
        version: VersionToken::new(file.sha),
    })
}

#[async_trait]
impl TextStore for GithubContents {
    async fn read(&self, path: &str) -> Result<StoredFile> {
        let mut url = self.contents_url(path)?;
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        debug!("reading {} from {}", path, self.repo);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::fail(Call::Read, path, response).await);
        }

        let body = response.text().await?;
        parse_content_file(path, &body)
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<WriteReceipt> {
        let call = if expected.is_some() { Call::Update } else { Call::Create };
        let request = ContentWriteRequest {
            message,
            content: Some(STANDARD.encode(content)),
            sha: expected.map(|v| v.as_str()),
            branch: self.branch.as_deref(),
        };

        let response = self
            .client
            .put(self.contents_url(path)?)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(call, path, response).await);
        }

        let body: ContentCommitResponse = response.json().await?;
        let version = body
            .content
            .map(|c| VersionToken::new(c.sha))
            .ok_or_else(|| StoreError::InvalidResponse(format!("{}: write returned no content", path)))?;
        info!("{} {} in commit {}", if expected.is_some() { "updated" } else { "created" }, path, body.commit.sha);

        Ok(WriteReceipt {
            version,
            commit: body.commit.sha,
        })
    }

    async fn delete(&self, path: &str, message: &str, expected: &VersionToken) -> Result<String> {
        let request = ContentWriteRequest {
            message,
            content: None,
            sha: Some(expected.as_str()),
            branch: self.branch.as_deref(),
        };

        let response = self
            .client
            .delete(self.contents_url(path)?)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(Call::Delete, path, response).await);
        }

        let body: ContentCommitResponse = response.json().await?;
        info!("deleted {} in commit {}", path, body.commit.sha);
        Ok(body.commit.sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoSlug {
        RepoSlug::parse("meetpatel1812/mcmaster_course_outline_app").unwrap()
    }

    #[test]
    fn url_encodes_each_segment() {
        let url = contents_url(
            "https://api.github.com",
            &repo(),
            "Course/Core_course/Intro to #1?.pdf",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/meetpatel1812/mcmaster_course_outline_app/contents/Course/Core_course/Intro%20to%20%231%3F.pdf"
        );
    }

    #[test]
    fn url_keeps_enterprise_prefix() {
        let url = contents_url("https://ghe.example.com/api/v3", &repo(), "pdf_data.py").unwrap();
        assert_eq!(url.path(), "/api/v3/repos/meetpatel1812/mcmaster_course_outline_app/contents/pdf_data.py");
    }

    #[test]
    fn status_mapping() {
        let path = "pdf_data.py";
        assert!(matches!(
            classify_status(Call::Read, path, StatusCode::NOT_FOUND, String::new()),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            classify_status(Call::Update, path, StatusCode::CONFLICT, String::new()),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            classify_status(Call::Create, path, StatusCode::UNPROCESSABLE_ENTITY, String::new()),
            StoreError::AlreadyExists(_)
        ));
        assert!(matches!(
            classify_status(Call::Update, path, StatusCode::UNPROCESSABLE_ENTITY, String::new()),
            StoreError::Conflict(_)
        ));
        match classify_status(Call::Read, path, StatusCode::TOO_MANY_REQUESTS, "slow down".to_string()) {
            StoreError::RemoteUnavailable { status, message } => {
                assert_eq!(status, Some(429));
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            classify_status(Call::Read, path, StatusCode::UNAUTHORIZED, String::new()),
            StoreError::RemoteUnavailable { status: Some(401), .. }
        ));
    }

    #[test]
    fn decodes_wrapped_base64() {
        let encoded = "cGRmcyA9IFtd\nCg==\n";
        assert_eq!(decode_content("pdf_data.py", encoded).unwrap(), b"pdfs = []\n");
        assert!(matches!(
            decode_content("pdf_data.py", "not base64!"),
            Err(StoreError::InvalidResponse(_))
        ));
    }

    fn file_body(encoding: &str, size: u64, content: &str) -> String {
        serde_json::json!({
            "type": "file",
            "encoding": encoding,
            "size": size,
            "name": "pdf_data.py",
            "path": "pdf_data.py",
            "content": content,
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
        })
        .to_string()
    }

    #[test]
    fn parses_file_body() {
        let file = parse_content_file("pdf_data.py", &file_body("base64", 10, "cGRmcyA9IFtd\nCg==\n")).unwrap();
        assert_eq!(file.content, b"pdfs = []\n");
        assert_eq!(file.version.as_str(), "3d21ec53a331a6f037a91c368710b99387d012c1");
    }

    #[test]
    fn empty_file_has_no_content() {
        let file = parse_content_file("pdf_data.py", &file_body("base64", 0, "")).unwrap();
        assert!(file.content.is_empty());

        let file = parse_content_file("pdf_data.py", &file_body("none", 0, "")).unwrap();
        assert!(file.content.is_empty());
    }

    #[test]
    fn large_file_without_content_is_rejected() {
        let err = parse_content_file("big.pdf", &file_body("none", 2_000_000, "")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidResponse(_)));
    }

    #[test]
    fn directory_listing_is_rejected() {
        let listing = serde_json::json!([{
            "type": "file",
            "size": 1,
            "name": "a.pdf",
            "path": "Course/a.pdf",
            "sha": "abc",
        }])
        .to_string();
        let err = parse_content_file("Course", &listing).unwrap_err();
        assert!(matches!(err, StoreError::InvalidResponse(_)));
    }

    #[test]
    fn non_file_entry_is_rejected() {
        let body = serde_json::json!({
            "type": "symlink",
            "size": 8,
            "name": "link",
            "path": "link",
            "sha": "abc",
        })
        .to_string();
        match parse_content_file("link", &body).unwrap_err() {
            StoreError::InvalidResponse(message) => assert!(message.contains("symlink")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn write_request_omits_absent_fields() {
        let create = ContentWriteRequest {
            message: "Add PDF for ENG701",
            content: Some("AA==".to_string()),
            sha: None,
            branch: None,
        };
        assert_eq!(
            serde_json::to_value(&create).unwrap(),
            serde_json::json!({"message": "Add PDF for ENG701", "content": "AA=="})
        );
    }
}
