use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored short link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub code: String,
    pub url: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
    pub last_clicked: Option<DateTime<Utc>>,
}

impl Link {
    /// A fresh record that has never been visited.
    pub fn new(code: impl Into<String>, url: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            url: url.into(),
            clicks: 0,
            created_at,
            last_clicked: None,
        }
    }
}

/// Body of `POST /api/links`.
///
/// Fields are kept as raw JSON so a wrong-typed field can be reported as an
/// invalid url or code rather than as a decoding failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLinkRequest {
    #[serde(default)]
    url: Value,
    #[serde(default)]
    code: Value,
}

/// The `code` field of a create request.
#[derive(Debug, PartialEq, Eq)]
pub enum RequestedCode<'a> {
    /// Absent, null or empty: generate one.
    Generate,
    Custom(&'a str),
    /// Present but not a string.
    Malformed,
}

impl CreateLinkRequest {
    /// Decode a request body. Anything that is not a JSON object reads as an
    /// empty request.
    pub fn from_slice(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The requested url, or `""` when missing or not a string.
    pub fn url(&self) -> &str {
        self.url.as_str().unwrap_or_default()
    }

    pub fn code(&self) -> RequestedCode<'_> {
        match &self.code {
            Value::Null => RequestedCode::Generate,
            Value::String(code) if code.is_empty() => RequestedCode::Generate,
            Value::String(code) => RequestedCode::Custom(code),
            _ => RequestedCode::Malformed,
        }
    }
}

/// Response body for a newly created link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLink {
    #[serde(flatten)]
    pub link: Link,
    pub short_url: String,
}

impl CreatedLink {
    pub fn new(link: Link, base_url: &str) -> Self {
        let short_url = format!("{}/{}", base_url.trim_end_matches('/'), link.code);
        Self { link, short_url }
    }
}
