/* This file is part of the Caption Relay project
*
*  Copyright (C) 2025 mini_bomba
*
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use serde::{Deserialize, Serialize};

/// Body accepted by both `/metadata` and `/transcript`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CaptionRequest {
    #[serde(alias = "url")]
    pub youtube_url: String,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_generated: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiTrack {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}
#[cfg(feature = "caption-parser")]
impl From<&caption_parser::CaptionTrack> for ApiTrack {
    fn from(value: &caption_parser::CaptionTrack) -> Self {
        Self {
            language: value.language.clone(),
            language_code: value.language_code.clone(),
            is_generated: value.is_generated,
            is_translatable: value.is_translatable,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MetadataResponse {
    pub transcripts: Vec<ApiTrack>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TranscriptResponse {
    pub transcript: String,
}

/// Body of every error response
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusResponse {
    pub server_version: String,
    pub server_git_hash: Option<String>,
    pub server_git_dirty: Option<bool>,
    pub server_git_commit_timestamp: Option<String>,
    pub server_build_timestamp: Option<i64>,
    pub server_startup_timestamp: i64,
    pub engine_version: String,
    pub proxy_enabled: bool,
    pub cookies_found: bool,
    pub metadata_cached: usize,
    pub transcripts_cached: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_url_alias() {
        let req: CaptionRequest = serde_json::from_str(r#"{"url": "https://youtu.be/abc123"}"#).unwrap();
        assert_eq!(req.youtube_url, "https://youtu.be/abc123");
        assert_eq!(req.language_code, None);
        assert_eq!(req.is_generated, None);
    }

    #[test]
    fn test_request_full() {
        let req: CaptionRequest = serde_json::from_str(r#"{"youtube_url": "abc123", "language_code": "es", "is_generated": false}"#).unwrap();
        assert_eq!(req, CaptionRequest {
            youtube_url: "abc123".to_owned(),
            language_code: Some("es".to_owned()),
            is_generated: Some(false),
        });
    }

    #[test]
    fn test_request_null_fields() {
        let req: CaptionRequest = serde_json::from_str(r#"{"youtube_url": "abc123", "language_code": null, "is_generated": null}"#).unwrap();
        assert_eq!(req.language_code, None);
        assert_eq!(req.is_generated, None);
    }

    #[test]
    fn test_request_requires_url() {
        assert!(serde_json::from_str::<CaptionRequest>(r#"{"language_code": "en"}"#).is_err());
    }
}
