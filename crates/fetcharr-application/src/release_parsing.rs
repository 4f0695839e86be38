// SPDX-License-Identifier: GPL-3.0-or-later
use fetcharr_domain::{
    Language, Modifier, Quality, QualityDetectionSource, QualityModel, QualitySource, Resolution,
    Revision,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Metadata extracted from a single release name. One of these exists per
/// independently parsed snapshot (download client item, folder, file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedReleaseInfo {
    pub movie_title: String,
    pub year: Option<i32>,
    pub quality: QualityModel,
    pub languages: Vec<Language>,
    pub edition: Option<String>,
    pub release_group: Option<String>,
}

/// Parse a scene-style release name into its metadata components.
pub fn parse_release_title(title: &str) -> ParsedReleaseInfo {
    let normalized = normalize_separators(title);
    let year = detect_year(&normalized);
    let quality = detect_quality(&normalized);
    let languages = detect_languages(&normalized);
    let edition = detect_edition(&normalized);
    let release_group = detect_release_group(title.trim());
    let movie_title = extract_movie_title(&normalized, year);

    ParsedReleaseInfo {
        movie_title,
        year,
        quality,
        languages,
        edition,
        release_group,
    }
}

/// Normalization applied before title equality checks: Unicode NFKD with
/// combining marks stripped, casefolded, `&` expanded, punctuation removed,
/// whitespace collapsed. The exact-title specification takes this as its
/// default strategy; the catalog layer is expected to guarantee the same
/// rules on its side.
pub fn clean_title(title: &str) -> String {
    let decomposed: String = title.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let expanded = decomposed.replace('&', " and ");

    let mut cleaned = String::with_capacity(expanded.len());
    for c in expanded.chars() {
        if c.is_alphanumeric() {
            cleaned.extend(c.to_lowercase());
        } else if c.is_whitespace() || matches!(c, '.' | '_' | '-' | ':') {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_separators(input: &str) -> String {
    input
        .replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

fn detect_year(title: &str) -> Option<i32> {
    lazy_static! {
        static ref YEAR_REGEX: Regex =
            Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("valid year regex");
    }

    // The last plausible year wins so titles that themselves contain a year
    // ("2001 A Space Odyssey 1968") resolve to the release year.
    YEAR_REGEX
        .find_iter(title)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

fn detect_quality(title: &str) -> QualityModel {
    let lowercase = title.to_lowercase();

    let source = detect_source(&lowercase);
    let resolution = detect_resolution(&lowercase);
    let modifier = detect_modifier(&lowercase);
    let revision = detect_revision(&lowercase);

    QualityModel {
        quality: Quality::new(source, resolution, modifier),
        revision,
        source_detection: QualityDetectionSource::Name,
        resolution_detection: QualityDetectionSource::Name,
    }
}

fn detect_source(lowercase: &str) -> QualitySource {
    lazy_static! {
        static ref BLURAY_REGEX: Regex =
            Regex::new(r"\b(blu-?ray|bd-?rip|br-?rip|bdmv|remux)\b").expect("valid bluray regex");
        static ref WEBDL_REGEX: Regex =
            Regex::new(r"\b(web-?dl|webdl|web)\b").expect("valid webdl regex");
        static ref WEBRIP_REGEX: Regex =
            Regex::new(r"\b(web-?rip)\b").expect("valid webrip regex");
        static ref TV_REGEX: Regex =
            Regex::new(r"\b(hdtv|pdtv|sdtv|dsr|tvrip)\b").expect("valid tv regex");
        static ref DVD_REGEX: Regex =
            Regex::new(r"\b(dvd-?rip|dvd|ntsc|pal)\b").expect("valid dvd regex");
        static ref TELECINE_REGEX: Regex =
            Regex::new(r"\b(telecine|tc)\b").expect("valid telecine regex");
        static ref CAM_REGEX: Regex =
            Regex::new(r"\b(cam-?rip|cam|hdcam|hd-?ts|hdts)\b").expect("valid cam regex");
    }

    if BLURAY_REGEX.is_match(lowercase) {
        QualitySource::Bluray
    } else if WEBRIP_REGEX.is_match(lowercase) {
        QualitySource::Webrip
    } else if WEBDL_REGEX.is_match(lowercase) {
        QualitySource::Webdl
    } else if TV_REGEX.is_match(lowercase) {
        QualitySource::Television
    } else if DVD_REGEX.is_match(lowercase) {
        QualitySource::Dvd
    } else if TELECINE_REGEX.is_match(lowercase) {
        QualitySource::Telecine
    } else if CAM_REGEX.is_match(lowercase) {
        QualitySource::Cam
    } else {
        QualitySource::Unknown
    }
}

fn detect_resolution(lowercase: &str) -> Resolution {
    if lowercase.contains("2160p") || lowercase.contains("4k") || lowercase.contains("uhd") {
        Resolution::R2160
    } else if lowercase.contains("1080p") || lowercase.contains("1080i") {
        Resolution::R1080
    } else if lowercase.contains("720p") {
        Resolution::R720
    } else if lowercase.contains("576p") {
        Resolution::R576
    } else if lowercase.contains("480p") || lowercase.contains("480i") {
        Resolution::R480
    } else {
        Resolution::Unknown
    }
}

fn detect_modifier(lowercase: &str) -> Modifier {
    lazy_static! {
        static ref BRDISK_REGEX: Regex =
            Regex::new(r"\b(complete bluray|brdisk|bd25|bd50|avc|mvc)\b")
                .expect("valid brdisk regex");
        static ref SCREENER_REGEX: Regex =
            Regex::new(r"\b(dvd-?scr|screener|scr)\b").expect("valid screener regex");
    }

    if lowercase.contains("remux") {
        Modifier::Remux
    } else if BRDISK_REGEX.is_match(lowercase) {
        Modifier::Brdisk
    } else if lowercase.contains("rawhd") {
        Modifier::Rawhd
    } else if SCREENER_REGEX.is_match(lowercase) {
        Modifier::Screener
    } else {
        Modifier::None
    }
}

fn detect_revision(lowercase: &str) -> Revision {
    lazy_static! {
        static ref VERSION_REGEX: Regex = Regex::new(r"\bv(?P<version>[2-5])\b").expect("valid version regex");
    }

    let mut version = 1;
    if lowercase.contains("proper") || lowercase.contains("repack") {
        version = 2;
    }
    if let Some(captures) = VERSION_REGEX.captures(lowercase) {
        if let Some(v) = captures.name("version").and_then(|m| m.as_str().parse().ok()) {
            version = std::cmp::max(version, v);
        }
    }

    let real = lowercase.matches(" real ").count() as u32;

    Revision::new(version, real)
}

fn detect_languages(title: &str) -> Vec<Language> {
    let lowercase = title.to_lowercase();
    let tokens: Vec<(&str, Language)> = vec![
        ("french", Language::French),
        ("vostfr", Language::French),
        ("german", Language::German),
        ("spanish", Language::Spanish),
        ("italian", Language::Italian),
        ("portuguese", Language::Portuguese),
        ("dutch", Language::Dutch),
        ("russian", Language::Russian),
        ("japanese", Language::Japanese),
    ];

    let mut languages: Vec<Language> = tokens
        .into_iter()
        .filter(|(token, _)| {
            lowercase
                .split_whitespace()
                .any(|word| word == *token)
        })
        .map(|(_, language)| language)
        .collect();

    if languages.is_empty() {
        languages.push(Language::English);
    }

    languages
}

fn detect_edition(title: &str) -> Option<String> {
    lazy_static! {
        static ref EDITION_REGEX: Regex = Regex::new(
            r"(?i)\b(?P<edition>(extended|unrated|theatrical|imax|director'?s))( (cut|edition))?\b"
        )
        .expect("valid edition regex");
    }

    EDITION_REGEX
        .captures(title)
        .and_then(|captures| captures.name("edition").map(|m| m.as_str().to_lowercase()))
}

fn detect_release_group(title: &str) -> Option<String> {
    lazy_static! {
        static ref GROUP_REGEX: Regex =
            Regex::new(r"-(?P<group>[A-Za-z0-9][A-Za-z0-9_]{1,31})$").expect("valid group regex");
    }

    GROUP_REGEX
        .captures(title)
        .and_then(|captures| captures.name("group").map(|m| m.as_str().to_string()))
}

fn extract_movie_title(normalized: &str, year: Option<i32>) -> String {
    let candidate = match year {
        Some(year) => {
            let marker = year.to_string();
            match normalized.find(&marker) {
                Some(index) => &normalized[..index],
                None => normalized,
            }
        }
        None => {
            // Without a year anchor, cut at the first quality-ish token.
            let lowercase = normalized.to_lowercase();
            let cut = ["1080p", "720p", "2160p", "480p", "bluray", "webdl", "web-dl", "webrip", "hdtv", "dvdrip", "remux", "xvid", "x264", "x265"]
                .iter()
                .filter_map(|token| lowercase.find(token))
                .min();
            match cut {
                Some(index) => &normalized[..index],
                None => normalized,
            }
        }
    };

    candidate
        .trim()
        .trim_end_matches(['-', '(', '['])
        .trim()
        .to_string()
}
