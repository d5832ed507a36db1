//! Option resolution: merge several, possibly conflicting, user toggles into
//! one concrete option value.
//!
//! Resolution is an ordered list of `(predicate, result)` rules evaluated top
//! to bottom; the first matching rule wins. Explicit intent is listed before
//! inference so a detected content type can never override what the user
//! asked for.

use serde::{Deserialize, Serialize};

/// OCR settings handed to the inbound converter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum OcrOptions {
    /// The converter applies its own heuristics.
    #[default]
    Disabled,
    /// Run text recognition; `force` also runs it on pages that already
    /// carry a text layer.
    Enabled {
        force: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
}

impl OcrOptions {
    pub fn is_enabled(&self) -> bool {
        matches!(self, OcrOptions::Enabled { .. })
    }
}

/// Raw OCR inputs collected by an entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrRequest {
    /// Explicit "turn OCR on".
    pub enable: bool,
    /// Explicit "OCR even when a text layer exists".
    pub force: bool,
    /// Explicit recognition language, e.g. `"eng"`.
    pub language: Option<String>,
    /// The content was classified as an image.
    pub is_image: bool,
}

impl OcrRequest {
    /// Interpret the HTTP form fields `ocr` and `ocr_lang`.
    ///
    /// `ocr` accepts `"true"`/`"1"` (enable) and `"force"`; anything else is
    /// ignored. Blank languages are treated as absent.
    pub fn from_form(ocr: Option<&str>, language: Option<&str>, is_image: bool) -> Self {
        let ocr = ocr.map(str::trim);
        Self {
            enable: matches!(ocr, Some("true") | Some("1")),
            force: ocr == Some("force"),
            language: language
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            is_image,
        }
    }

    fn has_explicit_setting(&self) -> bool {
        self.enable || self.force || self.language.is_some()
    }
}

type Rule<T> = (fn(&OcrRequest) -> bool, fn(&OcrRequest) -> T);

const OCR_RULES: &[Rule<OcrOptions>] = &[
    (OcrRequest::has_explicit_setting, |r| OcrOptions::Enabled {
        force: r.force,
        language: r.language.clone(),
    }),
    // Images have no text layer, so extraction must be forced.
    (|r| r.is_image, |_| OcrOptions::Enabled {
        force: true,
        language: None,
    }),
];

/// Resolve OCR toggles into one [`OcrOptions`] value.
pub fn resolve_ocr(request: &OcrRequest) -> OcrOptions {
    first_match(OCR_RULES, request).unwrap_or_default()
}

fn first_match<T>(rules: &[Rule<T>], request: &OcrRequest) -> Option<T> {
    rules
        .iter()
        .find(|(applies, _)| applies(request))
        .map(|(_, produce)| produce(request))
}
