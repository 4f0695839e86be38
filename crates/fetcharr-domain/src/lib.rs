// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Value Objects & IDs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieId(pub Uuid);

impl MovieId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for MovieId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub Uuid);

impl CollectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for CollectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieStatus {
    Announced,
    InCinemas,
    Released,
}

impl std::fmt::Display for MovieStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Announced => write!(f, "announced"),
            Self::InCinemas => write!(f, "incinemas"),
            Self::Released => write!(f, "released"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadProtocol {
    Usenet,
    Torrent,
}

impl std::fmt::Display for DownloadProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usenet => write!(f, "usenet"),
            Self::Torrent => write!(f, "torrent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    French,
    German,
    Spanish,
    Italian,
    Portuguese,
    Dutch,
    Russian,
    Japanese,
    Unknown,
}

impl Language {
    /// English is the library default; aggregation prefers any other
    /// detected language over it.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::English)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::English => "English",
            Self::French => "French",
            Self::German => "German",
            Self::Spanish => "Spanish",
            Self::Italian => "Italian",
            Self::Portuguese => "Portuguese",
            Self::Dutch => "Dutch",
            Self::Russian => "Russian",
            Self::Japanese => "Japanese",
            Self::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Quality Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualitySource {
    Unknown,
    Cam,
    Telecine,
    Dvd,
    Television,
    Webrip,
    Webdl,
    Bluray,
}

impl QualitySource {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl Default for QualitySource {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for QualitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Cam => "cam",
            Self::Telecine => "telecine",
            Self::Dvd => "dvd",
            Self::Television => "television",
            Self::Webrip => "webrip",
            Self::Webdl => "webdl",
            Self::Bluray => "bluray",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Unknown,
    R480,
    R576,
    R720,
    R1080,
    R2160,
}

impl Resolution {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::R480 => "480p",
            Self::R576 => "576p",
            Self::R720 => "720p",
            Self::R1080 => "1080p",
            Self::R2160 => "2160p",
        };
        write!(f, "{}", name)
    }
}

/// Source modifiers ranked by severity. The ordinal order matters: the
/// aggregation merge lets a higher-ranked modifier win a confidence tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    None,
    Regional,
    Screener,
    Rawhd,
    Brdisk,
    Remux,
}

impl Default for Modifier {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Regional => "regional",
            Self::Screener => "screener",
            Self::Rawhd => "rawhd",
            Self::Brdisk => "brdisk",
            Self::Remux => "remux",
        };
        write!(f, "{}", name)
    }
}

/// Proper/repack revision. Ordered independently of confidence: a REAL
/// release outranks any repack count, a higher version outranks a lower one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Revision {
    pub real: u32,
    pub version: u32,
}

impl Revision {
    pub fn new(version: u32, real: u32) -> Self {
        Self { real, version }
    }

    pub fn is_repack(&self) -> bool {
        self.version > 1
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self { real: 0, version: 1 }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}r{}", self.version, self.real)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Quality {
    pub source: QualitySource,
    pub resolution: Resolution,
    pub modifier: Modifier,
}

impl Quality {
    pub fn new(source: QualitySource, resolution: Resolution, modifier: Modifier) -> Self {
        Self {
            source,
            resolution,
            modifier,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.source, self.resolution, self.modifier)
    }
}

/// How trustworthy a piece of quality evidence is. Higher variants win the
/// aggregation merge; a held value is only replaced by strictly higher
/// confidence or when the held value is still unknown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Confidence {
    Default,
    Fallback,
    MediaInfo,
    Name,
}

/// Diagnostic tag recorded on the final quality describing which evidence
/// tier supplied the winning value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityDetectionSource {
    Name,
    Extension,
    MediaInfo,
}

impl From<Confidence> for QualityDetectionSource {
    fn from(confidence: Confidence) -> Self {
        match confidence {
            Confidence::MediaInfo => Self::MediaInfo,
            Confidence::Fallback => Self::Extension,
            _ => Self::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityModel {
    pub quality: Quality,
    pub revision: Revision,
    pub source_detection: QualityDetectionSource,
    pub resolution_detection: QualityDetectionSource,
}

impl Default for QualityModel {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            revision: Revision::default(),
            source_detection: QualityDetectionSource::Name,
            resolution_detection: QualityDetectionSource::Name,
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub clean_title: String,
    pub year: Option<i32>,
    pub collection_id: Option<CollectionId>,
    pub status: MovieStatus,
    pub monitored: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: MovieId::new(),
            clean_title: title.to_lowercase(),
            title,
            year: None,
            collection_id: None,
            status: MovieStatus::Announced,
            monitored: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieCollection {
    pub id: CollectionId,
    pub title: String,
    pub clean_title: String,
    pub monitored: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MovieCollection {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: CollectionId::new(),
            clean_title: title.to_lowercase(),
            title,
            monitored: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Domain Validation
// ============================================================================

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

impl Validate for Movie {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(ValidationError {
                field: "title",
                message: "title cannot be empty".into(),
            });
        }
        if let Some(year) = self.year {
            if !(1888..=2100).contains(&year) {
                errors.push(ValidationError {
                    field: "year",
                    message: format!("year {} out of range", year),
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for MovieCollection {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(ValidationError {
                field: "title",
                message: "title cannot be empty".into(),
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// Domain Events (lightweight scaffolding)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<TPayload> {
    pub name: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub payload: TPayload,
}

impl<TPayload> DomainEvent<TPayload> {
    pub fn new(name: &'static str, payload: TPayload) -> Self {
        Self {
            name,
            occurred_at: Utc::now(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseGrabbedPayload {
    pub movie_ids: Vec<MovieId>,
    pub title: String,
    pub indexer: String,
}

pub type ReleaseGrabbed = DomainEvent<ReleaseGrabbedPayload>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedDownloadsRemovedPayload {
    pub download_ids: Vec<String>,
}

pub type TrackedDownloadsRemoved = DomainEvent<TrackedDownloadsRemovedPayload>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRefreshedPayload {
    pub total_items: usize,
    pub failed_clients: usize,
}

pub type QueueRefreshed = DomainEvent<QueueRefreshedPayload>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_orders_real_before_version() {
        let plain = Revision::default();
        let repack = Revision::new(2, 0);
        let real = Revision::new(1, 1);

        assert!(repack > plain);
        assert!(real > repack);
        assert!(repack.is_repack());
        assert!(!plain.is_repack());
    }

    #[test]
    fn modifier_ordinal_ranks_remux_highest() {
        assert!(Modifier::Remux > Modifier::Brdisk);
        assert!(Modifier::Brdisk > Modifier::Screener);
        assert!(Modifier::Screener > Modifier::None);
    }

    #[test]
    fn confidence_ordering() {
        assert!(Confidence::Name > Confidence::MediaInfo);
        assert!(Confidence::MediaInfo > Confidence::Fallback);
        assert!(Confidence::Fallback > Confidence::Default);
    }

    #[test]
    fn detection_source_mapping() {
        assert_eq!(
            QualityDetectionSource::from(Confidence::MediaInfo),
            QualityDetectionSource::MediaInfo
        );
        assert_eq!(
            QualityDetectionSource::from(Confidence::Fallback),
            QualityDetectionSource::Extension
        );
        assert_eq!(
            QualityDetectionSource::from(Confidence::Name),
            QualityDetectionSource::Name
        );
        assert_eq!(
            QualityDetectionSource::from(Confidence::Default),
            QualityDetectionSource::Name
        );
    }

    #[test]
    fn quality_model_defaults_to_unknown() {
        let model = QualityModel::default();
        assert!(model.quality.source.is_unknown());
        assert!(model.quality.resolution.is_unknown());
        assert_eq!(model.quality.modifier, Modifier::None);
        assert_eq!(model.revision, Revision::default());
    }

    #[test]
    fn movie_validation_rejects_empty_title_and_bad_year() {
        let mut movie = Movie::new("  ");
        movie.year = Some(1500);
        let errors = movie.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "title"));
        assert!(errors.iter().any(|e| e.field == "year"));
    }

    #[test]
    fn movie_constructor_defaults() {
        let movie = Movie::new("Hysteria");
        assert_eq!(movie.clean_title, "hysteria");
        assert!(movie.monitored);
        assert!(movie.collection_id.is_none());
        assert!(movie.validate().is_ok());
    }

    #[test]
    fn language_default_detection() {
        assert!(Language::English.is_default());
        assert!(!Language::French.is_default());
        assert_eq!(Language::Japanese.to_string(), "Japanese");
    }

    #[test]
    fn queue_refreshed_event() {
        let payload = QueueRefreshedPayload {
            total_items: 4,
            failed_clients: 1,
        };
        let event: QueueRefreshed = DomainEvent::new("queue.refreshed", payload);
        assert_eq!(event.name, "queue.refreshed");
        assert_eq!(event.payload.total_items, 4);
    }
}
