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

use std::{fmt::Display, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use caption_parser::{CaptionTracks, ChosenTrack, GeneratedPreference, NoTrackError, DEFAULT_LANGUAGE};
use log::info;

use crate::{cookies::CookieSource, proxy::ProxyEndpoint, video_id::VideoId};

/// Per-call settings handed to a [`CaptionSource`]
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub proxy: Option<ProxyEndpoint>,
    pub cookies: Option<PathBuf>,
    pub user_agent: Arc<str>,
    pub verbose: bool,
}

impl RequestOptions {
    /// Cookies are never sent together with a proxy.
    pub fn new(proxy: Option<ProxyEndpoint>, cookies: &CookieSource, user_agent: Arc<str>, verbose: bool) -> RequestOptions {
        let cookies = match (&proxy, cookies.path()) {
            (Some(_), Some(path)) => {
                info!("Cookies found at {} but SKIPPING because proxy is enabled", path.display());
                None
            },
            (None, Some(path)) => Some(path.to_path_buf()),
            (_, None) => None,
        };
        RequestOptions { proxy, cookies, user_agent, verbose }
    }
}

#[derive(Debug)]
pub enum SourceError {
    /// The engine ran, but refused or failed to extract the video
    Extraction(String),
    /// The video has captions, but none could be picked
    NoTrack(NoTrackError),
    /// Anything else: the engine could not be started, its output made no sense, ...
    Other(anyhow::Error),
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Extraction(..) => None,
            SourceError::NoTrack(ref err) => Some(err),
            SourceError::Other(ref err) => Some(err.as_ref()),
        }
    }
}
impl Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Extraction(ref msg) => write!(f, "{msg}"),
            SourceError::NoTrack(ref err) => write!(f, "{err}"),
            SourceError::Other(ref err) => write!(f, "{err:#}"),
        }
    }
}
impl From<anyhow::Error> for SourceError {
    fn from(value: anyhow::Error) -> Self {
        SourceError::Other(value)
    }
}
impl From<NoTrackError> for SourceError {
    fn from(value: NoTrackError) -> Self {
        SourceError::NoTrack(value)
    }
}

/// Something that can list the caption tracks of a video
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Version string of the underlying engine, shown in error messages
    fn version(&self) -> &str;

    /// List every caption track the video has
    async fn probe(&self, video_id: &VideoId, options: &RequestOptions) -> Result<CaptionTracks, SourceError>;

    /// Like [`CaptionSource::probe`], but for a caller that is about to download the given language
    async fn probe_subtitles(&self, video_id: &VideoId, _language: &str, options: &RequestOptions) -> Result<CaptionTracks, SourceError> {
        self.probe(video_id, options).await
    }

    /// Probe the video and pick the track that best matches the request
    async fn fetch(&self, video_id: &VideoId, language: Option<&str>, preference: GeneratedPreference, options: &RequestOptions) -> Result<ChosenTrack, SourceError> {
        let tracks = self.probe_subtitles(video_id, language.unwrap_or(DEFAULT_LANGUAGE), options).await?;
        let selected = tracks.select(language, preference)?;
        Ok(selected.to_owned_track())
    }
}
