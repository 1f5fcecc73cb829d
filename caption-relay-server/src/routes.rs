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
#![allow(clippy::needless_pass_by_value)]
use actix_web::{get, http::StatusCode, post, web, HttpRequest, Responder};
use anyhow::anyhow;
use caption_relay_api::{ApiTrack, CaptionRequest, MetadataResponse, StatusResponse, TranscriptResponse};
use chrono::DateTime;
use log::info;

use crate::{built_info, pipeline::TranscriptService, state::AppConfig, utils};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
       .service(helo)
       .service(get_status)
       .service(post_metadata)
       .service(post_transcript);
}

/// Malformed bodies get the same `{"detail": ...}` shape as every other error
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        utils::Error::from(anyhow!("Invalid request body: {err}")).set_status(StatusCode::BAD_REQUEST).into()
    })
}

type JsonResult<T> = utils::Result<web::Json<T>>;

#[get("/")]
async fn helo() -> impl Responder {
    "hi"
}

#[get("/status")]
async fn get_status(service: web::Data<TranscriptService>, config: web::Data<AppConfig>) -> web::Json<StatusResponse> {
    web::Json(StatusResponse {
        server_version: built_info::PKG_VERSION.into(),
        server_git_hash: built_info::GIT_COMMIT_HASH.map(std::convert::Into::into),
        server_git_dirty: built_info::GIT_DIRTY,
        server_git_commit_timestamp: built_info::GIT_COMMIT_TIMESTAMP.map(std::convert::Into::into),
        server_build_timestamp: DateTime::parse_from_rfc2822(built_info::BUILT_TIME_UTC).ok().map(|t| t.timestamp()),
        server_startup_timestamp: config.startup_timestamp.timestamp(),
        engine_version: service.engine_version().to_owned(),
        proxy_enabled: service.proxy_enabled(),
        cookies_found: service.cookies_found(),
        metadata_cached: service.metadata_cached(),
        transcripts_cached: service.transcripts_cached(),
    })
}

#[post("/metadata")]
async fn post_metadata(service: web::Data<TranscriptService>, body: web::Json<CaptionRequest>) -> JsonResult<MetadataResponse> {
    info!("Received metadata request for URL: {}", body.youtube_url);
    let tracks = service.metadata(&body.youtube_url).await?;
    Ok(web::Json(MetadataResponse {
        transcripts: tracks.iter().map(ApiTrack::from).collect(),
    }))
}

#[post("/transcript")]
async fn post_transcript(service: web::Data<TranscriptService>, body: web::Json<CaptionRequest>) -> JsonResult<TranscriptResponse> {
    info!("Received transcript request for URL: {}", body.youtube_url);
    let transcript = service.transcript(&body.youtube_url, body.language_code.as_deref(), body.is_generated.into()).await?;
    Ok(web::Json(TranscriptResponse {
        transcript: transcript.to_string(),
    }))
}
