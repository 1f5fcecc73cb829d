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

use serde::Deserialize;

use crate::TranscriptError;

/// A segmented timed-text document, as served with `fmt=json3`
///
/// Only the fields needed to recover the text are modelled, everything else
/// (timings, pen/window styles, ...) is ignored.
#[derive(Deserialize, Default, Debug)]
pub struct Json3Document {
    #[serde(default)]
    pub events: Vec<Json3Event>,
}

#[derive(Deserialize, Default, Debug)]
pub struct Json3Event {
    #[serde(default)]
    pub segs: Option<Vec<Json3Segment>>,
}

#[derive(Deserialize, Default, Debug)]
pub struct Json3Segment {
    #[serde(default)]
    pub utf8: Option<String>,
}

impl Json3Document {
    /// Iterate over every segment text, in document order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.events.iter()
            .filter_map(|event| event.segs.as_deref())
            .flatten()
            .filter_map(|seg| seg.utf8.as_deref())
    }

    /// Join all segment texts with single spaces and normalize the whitespace
    pub fn flatten(&self) -> String {
        let joined = self.texts().collect::<Vec<_>>().join(" ");
        collapse_whitespace(&joined)
    }
}

/// Replace every run of whitespace with a single space and trim both ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a json3 caption document into a single line of transcript text
pub fn parse_json3(document: &str) -> Result<String, TranscriptError> {
    let document: Json3Document = serde_json::from_str(document)?;
    let text = document.flatten();
    if text.is_empty() {
        return Err(TranscriptError::Empty);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_document() {
        let doc = r#"{"events":[{"segs":[{"utf8":"Hello"},{"utf8":" world"}]}]}"#;
        assert_eq!(parse_json3(doc).unwrap(), "Hello world");
    }

    #[test]
    fn test_parse_skips_missing_fields() {
        let doc = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 1000, "id": 1, "wpWinPosId": 1},
                {"tStartMs": 0, "segs": [{"utf8": "first"}, {"tOffsetMs": 20}]},
                {"tStartMs": 900, "aAppend": 1, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 1000, "segs": null},
                {"tStartMs": 1200, "segs": [{"utf8": "second\tline"}]}
            ]
        }"#;
        assert_eq!(parse_json3(doc).unwrap(), "first second line");
    }

    #[test]
    fn test_parse_without_events_is_empty() {
        assert!(matches!(parse_json3("{}"), Err(TranscriptError::Empty)));
        assert!(matches!(parse_json3(r#"{"events":[{"segs":[{"utf8":"  \n "}]}]}"#), Err(TranscriptError::Empty)));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_json3("WEBVTT\n\n00:00.000 --> 00:01.000\nhi"), Err(TranscriptError::Malformed(..))));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n b\t\tc  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace("\u{a0}non\u{2003}breaking"), "non breaking");
    }

    #[test]
    fn test_collapse_whitespace_is_idempotent() {
        let inputs = ["", " ", "a", " a  b ", "\tx\ny\r\nz ", "[Music]  \n\n  la la\u{3000}la"];
        for input in inputs {
            let once = collapse_whitespace(input);
            assert_eq!(collapse_whitespace(&once), once, "input: {input:?}");
        }
    }
}
