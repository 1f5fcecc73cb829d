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

use std::{fmt::Display, sync::Arc};

use anyhow::Context;
use caption_parser::{parse_json3, CaptionTrack, GeneratedPreference, TranscriptError};
use log::{debug, error, info, warn};
use reqwest::Client;

use crate::{
    cache::{Cache, MemoryCache},
    constants::{NO_CAPTIONS_MSG, NO_DOCUMENT_URL_MSG},
    cookies::CookieSource,
    proxy::ProxySelector,
    source::{CaptionSource, RequestOptions, SourceError},
    state::ExtractorConfig,
    video_id::VideoId,
};

pub type MetadataCache = Arc<dyn Cache<VideoId, Arc<[CaptionTrack]>>>;
/// Keyed on the language exactly as requested, since an absent language selects
/// through the fallback chain rather than as English
pub type TranscriptCache = Arc<dyn Cache<(VideoId, Option<String>), Arc<str>>>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// The client sent something we can't work with
    InvalidInput,
    /// The video or the requested captions can't be had
    Unavailable,
    Internal,
}

#[derive(Debug)]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl std::error::Error for PipelineError {}
impl Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail)
    }
}

/// Turns a video URL into caption metadata or a flattened transcript
pub struct TranscriptService {
    source: Arc<dyn CaptionSource>,
    proxies: ProxySelector,
    cookies: CookieSource,
    user_agent: Arc<str>,
    verbose: bool,
    metadata_cache: MetadataCache,
    transcript_cache: TranscriptCache,
    /// Used for caption documents; their URLs are fetched directly
    client: Client,
}

impl TranscriptService {
    pub fn new(source: Arc<dyn CaptionSource>, proxies: ProxySelector, cookies: CookieSource, extractor: &ExtractorConfig) -> anyhow::Result<TranscriptService> {
        Self::with_caches(source, proxies, cookies, extractor, Arc::new(MemoryCache::new()), Arc::new(MemoryCache::new()))
    }

    pub fn with_caches(
        source: Arc<dyn CaptionSource>,
        proxies: ProxySelector,
        cookies: CookieSource,
        extractor: &ExtractorConfig,
        metadata_cache: MetadataCache,
        transcript_cache: TranscriptCache,
    ) -> anyhow::Result<TranscriptService> {
        let client = Client::builder()
            .no_proxy()
            .user_agent(extractor.user_agent.as_str())
            .build()
            .context("Failed to build the caption document client")?;
        Ok(TranscriptService {
            source,
            proxies,
            cookies,
            user_agent: extractor.user_agent.as_str().into(),
            verbose: extractor.verbose,
            metadata_cache,
            transcript_cache,
            client,
        })
    }

    pub fn engine_version(&self) -> &str {
        self.source.version()
    }

    pub fn proxy_enabled(&self) -> bool {
        self.proxies.is_enabled()
    }

    pub fn cookies_found(&self) -> bool {
        self.cookies.is_found()
    }

    pub fn metadata_cached(&self) -> usize {
        self.metadata_cache.len()
    }

    pub fn transcripts_cached(&self) -> usize {
        self.transcript_cache.len()
    }

    /// List the caption tracks of a video
    pub async fn metadata(&self, input: &str) -> Result<Arc<[CaptionTrack]>, PipelineError> {
        let video_id = resolve(input)?;
        if let Some(tracks) = self.metadata_cache.get(&video_id) {
            debug!("Metadata cache hit for {video_id}");
            return Ok(tracks);
        }
        debug!("Metadata cache miss for {video_id}");

        let options = self.request_options().map_err(|e| self.internal(&e))?;
        let tracks = self.source.probe(&video_id, &options).await.map_err(|e| self.source_error(&video_id, e))?;
        if tracks.is_empty() {
            warn!("No captions available for {video_id}");
            return Err(self.unavailable(&NO_CAPTIONS_MSG));
        }

        let descriptors: Arc<[CaptionTrack]> = tracks.descriptors().into();
        self.metadata_cache.set(video_id, descriptors.clone());
        Ok(descriptors)
    }

    /// Fetch one caption track of a video, flattened into a single line of text
    pub async fn transcript(&self, input: &str, language: Option<&str>, preference: GeneratedPreference) -> Result<Arc<str>, PipelineError> {
        let video_id = resolve(input)?;
        let key = (video_id, language.map(str::to_owned));
        let wanted = key.1.as_deref().unwrap_or("default");
        if let Some(transcript) = self.transcript_cache.get(&key) {
            debug!("Transcript cache hit for {} ({wanted})", key.0);
            return Ok(transcript);
        }
        debug!("Transcript cache miss for {} ({wanted})", key.0);

        let options = self.request_options().map_err(|e| self.internal(&e))?;
        let track = self.source.fetch(&key.0, language, preference, &options).await.map_err(|e| self.source_error(&key.0, e))?;
        info!("Using {} track {} for {}", track.kind, track.language_code, key.0);

        let url = track.document_url().ok_or_else(|| self.internal(&NO_DOCUMENT_URL_MSG))?;
        let document = self.download(url).await.map_err(|e| self.internal(&e))?;
        let transcript: Arc<str> = match parse_json3(&document) {
            Ok(text) => text.into(),
            Err(TranscriptError::Empty) => return Err(self.unavailable(&TranscriptError::Empty)),
            Err(e @ TranscriptError::Malformed(..)) => {
                return Err(self.internal(&anyhow::Error::new(e)));
            },
        };

        self.transcript_cache.set(key, transcript.clone());
        Ok(transcript)
    }

    fn request_options(&self) -> anyhow::Result<RequestOptions> {
        let proxy = self.proxies.select().context("Failed to select a proxy")?;
        match proxy {
            Some(ref endpoint) => info!("Using proxy {}", endpoint.redacted()),
            None => debug!("Not using a proxy"),
        }
        Ok(RequestOptions::new(proxy, &self.cookies, self.user_agent.clone(), self.verbose))
    }

    async fn download(&self, url: &str) -> anyhow::Result<String> {
        let resp = self.client.get(url)
            .send()
            .await
            .context("Failed to request the caption document")?
            .error_for_status()
            .context("Caption document request failed")?;
        resp.text().await.context("Failed to read the caption document")
    }

    fn source_error(&self, video_id: &VideoId, err: SourceError) -> PipelineError {
        match err {
            SourceError::Extraction(msg) => {
                warn!("Extraction failed for {video_id}: {msg}");
                self.unavailable(&msg)
            },
            SourceError::NoTrack(err) => {
                warn!("{err} ({video_id})");
                self.unavailable(&err)
            },
            SourceError::Other(err) => self.internal(&err),
        }
    }

    fn unavailable(&self, msg: &dyn Display) -> PipelineError {
        PipelineError { kind: ErrorKind::Unavailable, detail: self.annotate(msg) }
    }

    fn internal(&self, msg: &dyn Display) -> PipelineError {
        error!("{msg:#}");
        PipelineError { kind: ErrorKind::Internal, detail: self.annotate(msg) }
    }

    /// Prefix the message with the engine version and proxy state, suffix it with the cookie state
    fn annotate(&self, msg: &dyn Display) -> String {
        let proxy = if self.proxies.is_enabled() { "ON" } else { "OFF" };
        format!("[v={} proxy={proxy}] {msg:#} [{}]", self.source.version(), self.cookies)
    }
}

fn resolve(input: &str) -> Result<VideoId, PipelineError> {
    VideoId::resolve(input).map_err(|e| {
        warn!("Rejected video url {input:?}");
        PipelineError { kind: ErrorKind::InvalidInput, detail: e.to_string() }
    })
}
