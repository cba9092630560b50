use serde::{Deserialize, Serialize};

/// JSON body returned by the CORS relay's `get` endpoint.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RelayEnvelope {
    #[serde(default)]
    pub contents: Option<String>,

    #[serde(default)]
    pub status: Option<RelayStatus>,
}

// --------------------------------------------------

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RelayStatus {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub content_type: Option<String>,

    #[serde(default)]
    pub http_code: Option<u16>,
}

impl RelayEnvelope {
    pub fn http_code(&self) -> Option<u16> {
        self.status.as_ref().and_then(|s| s.http_code)
    }
}
