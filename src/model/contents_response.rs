use serde::{Deserialize, Serialize};

/// `GET /repos/{owner}/{repo}/contents/{path}` 的文件响应
#[derive(Serialize, Deserialize, Debug)]
#[allow(dead_code)]
pub struct ContentFile {
    /// 原始字段名为 "type"
    #[serde(rename = "type")]
    pub type_field: String,

    #[serde(rename = "encoding")]
    pub encoding: Option<String>,

    #[serde(rename = "size")]
    pub size: u64,

    #[serde(rename = "name")]
    pub name: String,

    #[serde(rename = "path")]
    pub path: String,

    /// base64, wrapped at 60 columns
    #[serde(rename = "content")]
    pub content: Option<String>,

    #[serde(rename = "sha")]
    pub sha: String,
}

/// PUT / DELETE 请求体
#[derive(Serialize, Debug)]
pub struct ContentWriteRequest<'a> {
    pub message: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
}

/// PUT / DELETE 响应
#[derive(Serialize, Deserialize, Debug)]
#[allow(dead_code)]
pub struct ContentCommitResponse {
    /// null after a delete
    #[serde(rename = "content")]
    pub content: Option<ContentRef>,

    #[serde(rename = "commit")]
    pub commit: CommitRef,
}

#[derive(Serialize, Deserialize, Debug)]
#[allow(dead_code)]
pub struct ContentRef {
    #[serde(rename = "path")]
    pub path: String,

    #[serde(rename = "sha")]
    pub sha: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[allow(dead_code)]
pub struct CommitRef {
    #[serde(rename = "sha")]
    pub sha: String,

    #[serde(rename = "html_url")]
    pub html_url: Option<String>,
}

/// GitHub 错误响应
#[derive(Serialize, Deserialize, Debug)]
#[allow(dead_code)]
pub struct GithubErrorBody {
    #[serde(rename = "message")]
    pub message: String,

    #[serde(rename = "documentation_url")]
    pub documentation_url: Option<String>,
}
