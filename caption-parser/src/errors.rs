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

use std::fmt::Display;

/// No track in either map could satisfy the request, not even through the fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoTrackError {
    pub language: String,
}

impl std::error::Error for NoTrackError {}
impl Display for NoTrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No caption track found for language: {}", self.language)
    }
}

#[derive(Debug)]
pub enum TranscriptError {
    /// The caption document wasn't valid json3
    Malformed(serde_json::Error),
    /// The document parsed fine, but contained no text at all
    Empty,
}

impl std::error::Error for TranscriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranscriptError::Malformed(ref err) => Some(err),
            TranscriptError::Empty => None,
        }
    }
}
impl Display for TranscriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptError::Malformed(..) => write!(f, "Failed to parse the caption document"),
            TranscriptError::Empty => write!(f, "Caption track is empty."),
        }
    }
}
impl From<serde_json::Error> for TranscriptError {
    fn from(value: serde_json::Error) -> Self {
        TranscriptError::Malformed(value)
    }
}
