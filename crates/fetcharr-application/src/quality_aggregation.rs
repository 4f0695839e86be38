// SPDX-License-Identifier: GPL-3.0-or-later

//! Confidence-ranked quality merge.
//!
//! A downloaded item carries up to three independently parsed name snapshots
//! (the download-client-reported name, the containing folder, the file
//! itself) plus optional embedded stream information. Each registered
//! augmenter contributes partial evidence tagged with a [`Confidence`] tier;
//! the fold keeps, per field, the value backed by the highest confidence
//! seen, replacing a held value only on strictly higher confidence or while
//! the held value is still unknown.

use fetcharr_domain::{
    Confidence, Modifier, Quality, QualityModel, QualitySource, Resolution, Revision,
};
use tracing::trace;

use crate::release_parsing::ParsedReleaseInfo;

/// Stream properties read from the media container itself.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaStreamInfo {
    pub width: u32,
    pub height: u32,
    pub source_hint: Option<QualitySource>,
}

/// A download on disk with its independently parsed metadata snapshots.
#[derive(Debug, Clone, Default)]
pub struct LocalDownload {
    pub path: String,
    pub download_client_info: Option<ParsedReleaseInfo>,
    pub folder_info: Option<ParsedReleaseInfo>,
    pub file_info: Option<ParsedReleaseInfo>,
    pub media_info: Option<MediaStreamInfo>,
}

/// Partial, confidence-tagged evidence from a single augmenter.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityEvidence {
    pub source: QualitySource,
    pub source_confidence: Confidence,
    pub resolution: Resolution,
    pub resolution_confidence: Confidence,
    pub modifier: Modifier,
    pub modifier_confidence: Confidence,
    pub revision: Option<Revision>,
}

impl QualityEvidence {
    fn from_parsed(parsed: &ParsedReleaseInfo, confidence: Confidence) -> Self {
        let quality = parsed.quality.quality;
        Self {
            source: quality.source,
            source_confidence: confidence,
            resolution: quality.resolution,
            resolution_confidence: confidence,
            modifier: quality.modifier,
            modifier_confidence: confidence,
            revision: Some(parsed.quality.revision),
        }
    }
}

/// One evidence source. `order` fixes the registration sequence; among equal
/// confidences the earliest contributor wins.
pub trait QualityAugmenter: Send + Sync {
    fn name(&self) -> &'static str;
    fn order(&self) -> i32;
    fn augment(&self, local: &LocalDownload, other_files: bool) -> Option<QualityEvidence>;
}

/// Name reported by the download client.
pub struct AugmentFromDownloadClientItem;

impl QualityAugmenter for AugmentFromDownloadClientItem {
    fn name(&self) -> &'static str {
        "download_client_item"
    }

    fn order(&self) -> i32 {
        10
    }

    fn augment(&self, local: &LocalDownload, _other_files: bool) -> Option<QualityEvidence> {
        local
            .download_client_info
            .as_ref()
            .map(|parsed| QualityEvidence::from_parsed(parsed, Confidence::Name))
    }
}

/// Containing folder name. A folder describes the whole download, so its
/// evidence ranks below the file's own name.
pub struct AugmentFromFolderName;

impl QualityAugmenter for AugmentFromFolderName {
    fn name(&self) -> &'static str {
        "folder_name"
    }

    fn order(&self) -> i32 {
        20
    }

    fn augment(&self, local: &LocalDownload, _other_files: bool) -> Option<QualityEvidence> {
        local
            .folder_info
            .as_ref()
            .map(|parsed| QualityEvidence::from_parsed(parsed, Confidence::Fallback))
    }
}

/// The file's own name.
pub struct AugmentFromFileName;

impl QualityAugmenter for AugmentFromFileName {
    fn name(&self) -> &'static str {
        "file_name"
    }

    fn order(&self) -> i32 {
        30
    }

    fn augment(&self, local: &LocalDownload, _other_files: bool) -> Option<QualityEvidence> {
        local
            .file_info
            .as_ref()
            .map(|parsed| QualityEvidence::from_parsed(parsed, Confidence::Name))
    }
}

/// Container extension, consulted only as a weak hint for the source. Not
/// applicable when the file sits among other files: an .iso or .ts next to
/// the actual media is more likely an extra than the release itself.
pub struct AugmentFromExtension;

impl QualityAugmenter for AugmentFromExtension {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn order(&self) -> i32 {
        40
    }

    fn augment(&self, local: &LocalDownload, other_files: bool) -> Option<QualityEvidence> {
        if other_files {
            return None;
        }

        let extension = std::path::Path::new(&local.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())?;

        let source = match extension.as_str() {
            "ts" => QualitySource::Television,
            "iso" | "img" | "vob" => QualitySource::Dvd,
            "m2ts" => QualitySource::Bluray,
            _ => return None,
        };

        Some(QualityEvidence {
            source,
            source_confidence: Confidence::Fallback,
            resolution: Resolution::Unknown,
            resolution_confidence: Confidence::Default,
            modifier: Modifier::None,
            modifier_confidence: Confidence::Default,
            revision: None,
        })
    }
}

/// Embedded stream dimensions.
pub struct AugmentFromMediaInfo;

impl QualityAugmenter for AugmentFromMediaInfo {
    fn name(&self) -> &'static str {
        "media_info"
    }

    fn order(&self) -> i32 {
        50
    }

    fn augment(&self, local: &LocalDownload, _other_files: bool) -> Option<QualityEvidence> {
        let media = local.media_info.as_ref()?;

        let resolution = resolution_from_dimensions(media.width, media.height);
        let (source, source_confidence) = match media.source_hint {
            Some(source) => (source, Confidence::MediaInfo),
            None => (QualitySource::Unknown, Confidence::Default),
        };

        Some(QualityEvidence {
            source,
            source_confidence,
            resolution,
            resolution_confidence: Confidence::MediaInfo,
            modifier: Modifier::None,
            modifier_confidence: Confidence::Default,
            revision: None,
        })
    }
}

fn resolution_from_dimensions(width: u32, height: u32) -> Resolution {
    if height >= 2000 || width >= 3800 {
        Resolution::R2160
    } else if height >= 1000 || width >= 1800 {
        Resolution::R1080
    } else if height >= 700 || width >= 1200 {
        Resolution::R720
    } else if height >= 560 {
        Resolution::R576
    } else if height > 0 || width > 0 {
        Resolution::R480
    } else {
        Resolution::Unknown
    }
}

/// The standard augmenter set in registration order.
pub fn default_augmenters() -> Vec<Box<dyn QualityAugmenter>> {
    vec![
        Box::new(AugmentFromDownloadClientItem),
        Box::new(AugmentFromFolderName),
        Box::new(AugmentFromFileName),
        Box::new(AugmentFromExtension),
        Box::new(AugmentFromMediaInfo),
    ]
}

/// Fold all augmenter evidence into a single quality. Fields start unknown at
/// `Confidence::Default`; no evidence at all yields the defined unknown
/// default, never an error.
pub fn aggregate_quality(
    local: &LocalDownload,
    augmenters: &[Box<dyn QualityAugmenter>],
    other_files: bool,
) -> QualityModel {
    let mut ordered: Vec<&dyn QualityAugmenter> =
        augmenters.iter().map(|augmenter| augmenter.as_ref()).collect();
    ordered.sort_by_key(|augmenter| augmenter.order());

    let mut source = QualitySource::Unknown;
    let mut source_confidence = Confidence::Default;
    let mut resolution = Resolution::Unknown;
    let mut resolution_confidence = Confidence::Default;
    let mut modifier = Modifier::None;
    let mut modifier_confidence = Confidence::Default;
    let mut revision = Revision::default();

    for augmenter in ordered {
        let Some(evidence) = augmenter.augment(local, other_files) else {
            continue;
        };

        trace!(
            target: "quality_aggregation",
            augmenter = augmenter.name(),
            ?evidence,
            "merging evidence"
        );

        if !evidence.source.is_unknown()
            && (evidence.source_confidence > source_confidence || source.is_unknown())
        {
            source = evidence.source;
            source_confidence = evidence.source_confidence;
        }

        if !evidence.resolution.is_unknown()
            && (evidence.resolution_confidence > resolution_confidence
                || resolution.is_unknown())
        {
            resolution = evidence.resolution;
            resolution_confidence = evidence.resolution_confidence;
        }

        // Modifiers additionally resolve confidence ties by severity, so a
        // REMUX tag from one snapshot beats a BRDISK tag from another.
        if evidence.modifier != Modifier::None
            && (evidence.modifier_confidence > modifier_confidence
                || modifier == Modifier::None
                || (evidence.modifier_confidence == modifier_confidence
                    && evidence.modifier > modifier))
        {
            modifier = evidence.modifier;
            modifier_confidence = evidence.modifier_confidence;
        }

        if let Some(incoming) = evidence.revision {
            if incoming > revision {
                revision = incoming;
            }
        }
    }

    QualityModel {
        quality: Quality::new(source, resolution, modifier),
        revision,
        source_detection: source_confidence.into(),
        resolution_detection: resolution_confidence.into(),
    }
}
