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

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{NoTrackError, DEFAULT_LANGUAGE};

pub const JSON3_EXT: &str = "json3";

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrackKind {
    /// Authored by the uploader ("subtitles")
    Manual,
    /// Produced by speech recognition ("automatic captions")
    Generated,
}

/// Which kind of track the client asked for
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum GeneratedPreference {
    Generated,
    Manual,
    #[default]
    Any,
}

impl From<Option<bool>> for GeneratedPreference {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => GeneratedPreference::Generated,
            Some(false) => GeneratedPreference::Manual,
            None => GeneratedPreference::Any,
        }
    }
}

/// One downloadable representation of a caption track
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct CaptionFormat {
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// language code -> format variants, in the order the extractor listed them
pub type TrackMap = IndexMap<String, Vec<CaptionFormat>>;

/// Metadata describing one available track
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct CaptionTrack {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// All caption tracks available for a video
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct CaptionTracks {
    pub manual: TrackMap,
    pub generated: TrackMap,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct SelectedTrack<'a> {
    pub language_code: &'a str,
    pub kind: TrackKind,
    pub formats: &'a [CaptionFormat],
}

/// An owned copy of a [`SelectedTrack`], for handing it out of the [`CaptionTracks`] it came from
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ChosenTrack {
    pub language_code: String,
    pub kind: TrackKind,
    pub formats: Vec<CaptionFormat>,
}

impl CaptionTracks {
    /// Build the track set, dropping languages that have no formats at all
    pub fn new(mut manual: TrackMap, mut generated: TrackMap) -> CaptionTracks {
        manual.retain(|_, formats| !formats.is_empty());
        generated.retain(|_, formats| !formats.is_empty());
        CaptionTracks { manual, generated }
    }

    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.generated.is_empty()
    }

    fn map(&self, kind: TrackKind) -> &TrackMap {
        match kind {
            TrackKind::Manual => &self.manual,
            TrackKind::Generated => &self.generated,
        }
    }

    fn get(&self, kind: TrackKind, language_code: &str) -> Option<SelectedTrack<'_>> {
        self.map(kind).get_key_value(language_code).map(|(code, formats)| SelectedTrack { language_code: code, kind, formats })
    }

    fn first(&self, kind: TrackKind) -> Option<SelectedTrack<'_>> {
        self.map(kind).first().map(|(code, formats)| SelectedTrack { language_code: code, kind, formats })
    }

    /// Describe every track, manual ones first, each group in extractor order
    pub fn descriptors(&self) -> Vec<CaptionTrack> {
        let manual = self.manual.iter().map(|(code, formats)| describe(code, formats, TrackKind::Manual));
        let generated = self.generated.iter().map(|(code, formats)| describe(code, formats, TrackKind::Generated));
        manual.chain(generated).collect()
    }

    /// Pick the track that best matches the request.
    ///
    /// An explicitly requested language is honoured first, restricted to the
    /// requested kind if there was one (manual is preferred when there wasn't).
    /// If that fails, we fall back to generated English, then to the first
    /// manual track, then to the first generated track. This only fails when
    /// there are no tracks at all.
    pub fn select(&self, language: Option<&str>, preference: GeneratedPreference) -> Result<SelectedTrack<'_>, NoTrackError> {
        let exact = language.and_then(|lang| match preference {
            GeneratedPreference::Generated => self.get(TrackKind::Generated, lang),
            GeneratedPreference::Manual => self.get(TrackKind::Manual, lang),
            GeneratedPreference::Any => self.get(TrackKind::Manual, lang)
                .or_else(|| self.get(TrackKind::Generated, lang)),
        });
        if let Some(track) = exact {
            return Ok(track);
        }
        if let Some(lang) = language {
            debug!("No {preference} track for language {lang}, falling back");
        }

        self.get(TrackKind::Generated, DEFAULT_LANGUAGE)
            .or_else(|| self.first(TrackKind::Manual))
            .or_else(|| self.first(TrackKind::Generated))
            .ok_or_else(|| NoTrackError { language: language.unwrap_or(DEFAULT_LANGUAGE).to_owned() })
    }
}

fn describe(code: &str, formats: &[CaptionFormat], kind: TrackKind) -> CaptionTrack {
    CaptionTrack {
        language: formats.first()
            .and_then(|f| f.name.clone())
            .unwrap_or_else(|| code.to_owned()),
        language_code: code.to_owned(),
        is_generated: kind == TrackKind::Generated,
        is_translatable: true,
    }
}

impl SelectedTrack<'_> {
    pub fn document_url(&self) -> Option<&str> {
        document_url(self.formats)
    }

    pub fn to_owned_track(&self) -> ChosenTrack {
        ChosenTrack {
            language_code: self.language_code.to_owned(),
            kind: self.kind,
            formats: self.formats.to_vec(),
        }
    }
}

impl ChosenTrack {
    pub fn document_url(&self) -> Option<&str> {
        document_url(&self.formats)
    }
}

/// Location of the caption document to download.
///
/// Prefers the json3 variant, otherwise takes whatever the first variant is.
pub fn document_url(formats: &[CaptionFormat]) -> Option<&str> {
    formats.iter()
        .find(|f| f.ext.as_deref() == Some(JSON3_EXT))
        .and_then(|f| f.url.as_deref())
        .or_else(|| formats.first().and_then(|f| f.url.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(ext: &str, name: &str) -> CaptionFormat {
        CaptionFormat {
            ext: Some(ext.to_owned()),
            url: Some(format!("https://example.invalid/{name}.{ext}")),
            name: Some(name.to_owned()),
        }
    }

    fn track_map(langs: &[(&str, &str)]) -> TrackMap {
        langs.iter()
            .map(|(code, name)| ((*code).to_owned(), vec![format("vtt", name), format("json3", name)]))
            .collect()
    }

    fn tracks() -> CaptionTracks {
        CaptionTracks::new(
            track_map(&[("es", "Spanish"), ("de", "German")]),
            track_map(&[("fr", "French (auto)"), ("en", "English (auto)"), ("es", "Spanish (auto)")]),
        )
    }

    fn pick(tracks: &CaptionTracks, lang: Option<&str>, pref: Option<bool>) -> (String, TrackKind) {
        let track = tracks.select(lang, pref.into()).unwrap();
        (track.language_code.to_owned(), track.kind)
    }

    #[test]
    fn test_preference_from_option() {
        assert_eq!(GeneratedPreference::from(Some(true)), GeneratedPreference::Generated);
        assert_eq!(GeneratedPreference::from(Some(false)), GeneratedPreference::Manual);
        assert_eq!(GeneratedPreference::from(None), GeneratedPreference::Any);
    }

    #[test]
    fn test_exact_matches() {
        let tracks = tracks();
        assert_eq!(pick(&tracks, Some("es"), Some(false)), ("es".to_owned(), TrackKind::Manual));
        assert_eq!(pick(&tracks, Some("es"), Some(true)), ("es".to_owned(), TrackKind::Generated));
        assert_eq!(pick(&tracks, Some("es"), None), ("es".to_owned(), TrackKind::Manual));
        assert_eq!(pick(&tracks, Some("fr"), None), ("fr".to_owned(), TrackKind::Generated));
    }

    #[test]
    fn test_strict_kind_falls_back() {
        let tracks = tracks();
        // no manual french, so the explicit request can't be honoured
        assert_eq!(pick(&tracks, Some("fr"), Some(false)), ("en".to_owned(), TrackKind::Generated));
        assert_eq!(pick(&tracks, Some("de"), Some(true)), ("en".to_owned(), TrackKind::Generated));
    }

    #[test]
    fn test_fallback_chain() {
        let tracks = tracks();
        // without a language, the exact steps are skipped entirely
        assert_eq!(pick(&tracks, None, Some(false)), ("en".to_owned(), TrackKind::Generated));

        let no_english = CaptionTracks::new(track_map(&[("de", "German"), ("es", "Spanish")]), track_map(&[("fr", "French")]));
        assert_eq!(pick(&no_english, Some("it"), None), ("de".to_owned(), TrackKind::Manual));

        let generated_only = CaptionTracks::new(TrackMap::new(), track_map(&[("ja", "Japanese"), ("ko", "Korean")]));
        assert_eq!(pick(&generated_only, Some("it"), Some(false)), ("ja".to_owned(), TrackKind::Generated));
    }

    #[test]
    fn test_manual_english_is_not_preferred_without_language() {
        let tracks = CaptionTracks::new(track_map(&[("en", "English")]), track_map(&[("en", "English (auto)")]));
        assert_eq!(pick(&tracks, None, None), ("en".to_owned(), TrackKind::Generated));
        assert_eq!(pick(&tracks, Some("en"), None), ("en".to_owned(), TrackKind::Manual));
    }

    #[test]
    fn test_selection_is_total() {
        let langs = [("en", "English"), ("pt", "Portuguese")];
        let maps = [TrackMap::new(), track_map(&langs[..1]), track_map(&langs)];
        let requests = [None, Some("en"), Some("pt"), Some("xx")];
        let prefs = [None, Some(true), Some(false)];
        for manual in &maps {
            for generated in &maps {
                let tracks = CaptionTracks::new(manual.clone(), generated.clone());
                for lang in requests {
                    for pref in prefs {
                        let result = tracks.select(lang, pref.into());
                        assert_eq!(result.is_ok(), !tracks.is_empty(), "{manual:?} {generated:?} {lang:?} {pref:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_tracks_fail() {
        let err = CaptionTracks::default().select(Some("es"), GeneratedPreference::Any).unwrap_err();
        assert_eq!(err.language, "es");
        assert_eq!(err.to_string(), "No caption track found for language: es");
        let err = CaptionTracks::default().select(None, GeneratedPreference::Any).unwrap_err();
        assert_eq!(err.language, "en");
    }

    #[test]
    fn test_empty_format_lists_are_dropped() {
        let mut manual = track_map(&[("es", "Spanish")]);
        manual.insert("de".to_owned(), vec![]);
        let tracks = CaptionTracks::new(manual, TrackMap::new());
        assert_eq!(tracks.manual.len(), 1);
        assert_eq!(pick(&tracks, Some("de"), None), ("es".to_owned(), TrackKind::Manual));
    }

    #[test]
    fn test_descriptors() {
        let mut generated = track_map(&[("en", "English (auto)")]);
        generated.insert("xx".to_owned(), vec![CaptionFormat { ext: Some("json3".to_owned()), url: None, name: None }]);
        let tracks = CaptionTracks::new(track_map(&[("es", "Spanish")]), generated);
        let descriptors = tracks.descriptors();
        assert_eq!(descriptors, vec![
            CaptionTrack { language: "Spanish".to_owned(), language_code: "es".to_owned(), is_generated: false, is_translatable: true },
            CaptionTrack { language: "English (auto)".to_owned(), language_code: "en".to_owned(), is_generated: true, is_translatable: true },
            CaptionTrack { language: "xx".to_owned(), language_code: "xx".to_owned(), is_generated: true, is_translatable: true },
        ]);
    }

    #[test]
    fn test_document_url_prefers_json3() {
        let tracks = tracks();
        let track = tracks.select(Some("es"), GeneratedPreference::Manual).unwrap();
        assert_eq!(track.document_url(), Some("https://example.invalid/Spanish.json3"));
    }

    #[test]
    fn test_document_url_falls_back_to_first() {
        let formats = vec![format("srv1", "a"), format("vtt", "b")];
        let track = SelectedTrack { language_code: "en", kind: TrackKind::Manual, formats: &formats };
        assert_eq!(track.document_url(), Some("https://example.invalid/a.srv1"));

        let formats = vec![CaptionFormat { ext: Some("json3".to_owned()), url: None, name: None }, format("vtt", "b")];
        let track = SelectedTrack { language_code: "en", kind: TrackKind::Manual, formats: &formats };
        assert_eq!(track.document_url(), None);
        assert_eq!(document_url(&[]), None);
    }

    #[test]
    fn test_owned_track() {
        let tracks = tracks();
        let chosen = tracks.select(Some("fr"), GeneratedPreference::Any).unwrap().to_owned_track();
        assert_eq!(chosen.language_code, "fr");
        assert_eq!(chosen.kind, TrackKind::Generated);
        assert_eq!(chosen.formats.len(), 2);
        assert_eq!(chosen.document_url(), Some("https://example.invalid/French (auto).json3"));
    }
}
