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

use std::{fmt::Display, sync::{Arc, LazyLock}};

use reqwest::Url;

use crate::constants::INVALID_URL_MSG;

static YT_WATCH_URL: LazyLock<Url> = LazyLock::new(|| Url::parse("https://www.youtube.com/watch").expect("Should be able to parse the YT_WATCH_URL"));

const SHORT_LINK_HOST: &str = "youtu.be";
const PLATFORM_HOSTS: [&str; 2] = ["www.youtube.com", "youtube.com"];

/// Canonical identifier of a video, never empty
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct VideoId(Arc<str>);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InvalidVideoUrl;

impl std::error::Error for InvalidVideoUrl {}
impl Display for InvalidVideoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{INVALID_URL_MSG}")
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl VideoId {
    /// Extract the video id from a watch, short, embed or /v/ link.
    ///
    /// Input that doesn't look like a URL at all is taken as the id itself,
    /// as long as it's made of the characters video ids are made of.
    pub fn resolve(input: &str) -> Result<VideoId, InvalidVideoUrl> {
        let input = input.trim();
        let id = match Url::parse(input) {
            Ok(url) => id_from_url(&url),
            Err(_) if is_bare_id(input) => Some(input.to_owned()),
            Err(_) => None,
        };
        match id {
            Some(id) if !id.is_empty() => Ok(VideoId(id.into())),
            _ => Err(InvalidVideoUrl),
        }
    }

    /// The URL handed to the extractor
    pub fn watch_url(&self) -> Url {
        let mut url = YT_WATCH_URL.clone();
        url.query_pairs_mut().append_pair("v", &self.0);
        url
    }
}

fn id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if host == SHORT_LINK_HOST {
        // only the first segment names the video
        return url.path_segments()?.next().map(str::to_owned);
    }
    if !PLATFORM_HOSTS.contains(&host) {
        return None;
    }
    if url.path() == "/watch" {
        // first value wins
        return url.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned());
    }
    let mut segments = url.path_segments()?;
    match segments.next() {
        Some("embed" | "v") => segments.next().map(str::to_owned),
        _ => None,
    }
}

fn is_bare_id(input: &str) -> bool {
    !input.is_empty() && input.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(input: &str) -> Option<String> {
        VideoId::resolve(input).ok().map(|id| id.to_string())
    }

    #[test]
    fn test_equivalent_inputs() {
        let inputs = [
            "https://www.youtube.com/watch?v=abc123",
            "https://youtube.com/watch?v=abc123",
            "http://www.youtube.com/watch?feature=share&v=abc123&t=42",
            "https://www.youtube.com/watch?v=abc123&v=other",
            "https://youtu.be/abc123",
            "https://youtu.be/abc123?si=tracking",
            "https://youtu.be/abc123/extra",
            "https://youtu.be/abc123/",
            "https://www.youtube.com/embed/abc123",
            "https://www.youtube.com/embed/abc123?start=3",
            "https://www.youtube.com/v/abc123",
            "  https://www.youtube.com/watch?v=abc123  ",
            "abc123",
            " abc123\n",
        ];
        for input in inputs {
            assert_eq!(resolve(input).as_deref(), Some("abc123"), "input: {input:?}");
        }
    }

    #[test]
    fn test_real_ids() {
        assert_eq!(resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(resolve("-_aZ09-_aZ0").as_deref(), Some("-_aZ09-_aZ0"));
    }

    #[test]
    fn test_rejected_inputs() {
        let inputs = [
            "",
            "   ",
            "not a url",
            "youtube.com/watch?v=abc123",
            "https://www.youtube.com/",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?v=",
            "https://www.youtube.com/watch?list=PL123",
            "https://www.youtube.com/watch/?v=abc123",
            "https://www.youtube.com/shorts/abc123",
            "https://www.youtube.com/embed/",
            "https://youtu.be/",
            "https://youtu.be//abc123",
            "https://vimeo.com/12345",
            "https://m.youtube.com/watch?v=abc123",
            "ftp://example.com/abc123",
            "abc:123",
        ];
        for input in inputs {
            assert_eq!(VideoId::resolve(input), Err(InvalidVideoUrl), "input: {input:?}");
        }
    }

    #[test]
    fn test_watch_url() {
        let id = VideoId::resolve("https://youtu.be/abc123").unwrap();
        assert_eq!(id.watch_url().as_str(), "https://www.youtube.com/watch?v=abc123");
        assert_eq!(id.as_ref(), "abc123");
    }
}
