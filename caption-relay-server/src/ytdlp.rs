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

use std::{ffi::OsString, path::{Path, PathBuf}, process::{ExitStatus, Stdio}};

use anyhow::Context;
use async_trait::async_trait;
use caption_parser::{CaptionTracks, TrackMap, JSON3_EXT};
use log::{debug, warn};
use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};
use tokio::process::Command;

use crate::{source::{CaptionSource, RequestOptions, SourceError}, video_id::VideoId};

const UNKNOWN_VERSION: &str = "unknown";

/// [`CaptionSource`] backed by the `yt-dlp` executable
pub struct YtDlp {
    path: PathBuf,
    version: String,
}

/// The part of yt-dlp's info JSON we care about
#[serde_as]
#[derive(Deserialize, Debug, Default)]
struct VideoInfo {
    #[serde(default)]
    #[serde_as(as = "DefaultOnNull")]
    subtitles: TrackMap,
    #[serde(default)]
    #[serde_as(as = "DefaultOnNull")]
    automatic_captions: TrackMap,
}

impl VideoInfo {
    fn into_tracks(self) -> CaptionTracks {
        CaptionTracks::new(self.subtitles, self.automatic_captions)
    }
}

impl YtDlp {
    /// Set up the adapter, asking the executable for its version once
    pub async fn new(path: PathBuf) -> YtDlp {
        let version = match probe_version(&path).await {
            Ok(version) => version,
            Err(e) => {
                warn!("Could not determine the yt-dlp version: {e:#}");
                UNKNOWN_VERSION.to_owned()
            },
        };
        YtDlp { path, version }
    }

    fn args(video_id: &VideoId, subtitles_for: Option<&str>, options: &RequestOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-J".into(),
            "--skip-download".into(),
            "--no-playlist".into(),
            "--ignore-no-formats-error".into(),
            "--user-agent".into(),
            OsString::from(&*options.user_agent),
        ];
        if let Some(ref proxy) = options.proxy {
            args.extend([OsString::from("--proxy"), proxy.url().into()]);
        }
        if let Some(ref cookies) = options.cookies {
            args.extend([OsString::from("--cookies"), cookies.clone().into_os_string()]);
        }
        if options.verbose {
            args.push("--verbose".into());
        } else {
            args.extend([OsString::from("--quiet"), "--no-warnings".into()]);
        }
        if let Some(language) = subtitles_for {
            args.extend([
                OsString::from("--write-subs"),
                "--write-auto-subs".into(),
                "--sub-langs".into(),
                language.into(),
                "--sub-format".into(),
                JSON3_EXT.into(),
            ]);
        }
        args.extend([OsString::from("--"), video_id.watch_url().as_str().into()]);
        args
    }

    async fn run(&self, video_id: &VideoId, subtitles_for: Option<&str>, options: &RequestOptions) -> Result<CaptionTracks, SourceError> {
        let output = Command::new(&self.path)
            .args(Self::args(video_id, subtitles_for, options))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.path.display()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            debug!("yt-dlp stderr for {video_id}:\n{stderr}");
            return Err(SourceError::Extraction(extraction_message(&stderr, output.status)));
        }
        if !stderr.is_empty() {
            debug!("yt-dlp stderr for {video_id}:\n{stderr}");
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout).context("Failed to deserialize yt-dlp output")?;
        Ok(info.into_tracks())
    }
}

#[async_trait]
impl CaptionSource for YtDlp {
    fn version(&self) -> &str {
        &self.version
    }

    async fn probe(&self, video_id: &VideoId, options: &RequestOptions) -> Result<CaptionTracks, SourceError> {
        self.run(video_id, None, options).await
    }

    async fn probe_subtitles(&self, video_id: &VideoId, language: &str, options: &RequestOptions) -> Result<CaptionTracks, SourceError> {
        self.run(video_id, Some(language), options).await
    }
}

async fn probe_version(path: &Path) -> anyhow::Result<String> {
    let output = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to run {}", path.display()))?;
    if !output.status.success() {
        anyhow::bail!("{} --version exited with {}", path.display(), output.status);
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if version.is_empty() {
        anyhow::bail!("{} --version printed nothing", path.display());
    }
    Ok(version)
}

/// Boil the engine's stderr down to what it said went wrong
fn extraction_message(stderr: &str, status: ExitStatus) -> String {
    let errors: Vec<&str> = stderr.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();
    if !errors.is_empty() {
        return errors.join("; ");
    }
    stderr.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map_or_else(|| format!("yt-dlp failed ({status})"), str::to_owned)
}
