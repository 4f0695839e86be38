// SPDX-License-Identifier: GPL-3.0-or-later

//! Language pick across metadata snapshots.
//!
//! Snapshots are consulted in preference order (download client item, folder,
//! file); the first one carrying a non-English language wins, even when a
//! lower-priority snapshot would also have reported English. Everything
//! English or absent falls back to the library default.

use fetcharr_domain::Language;

use crate::quality_aggregation::LocalDownload;

pub fn aggregate_languages(local: &LocalDownload) -> Vec<Language> {
    let snapshots = [
        local.download_client_info.as_ref(),
        local.folder_info.as_ref(),
        local.file_info.as_ref(),
    ];

    for parsed in snapshots.into_iter().flatten() {
        let has_foreign = parsed
            .languages
            .iter()
            .any(|language| !language.is_default() && *language != Language::Unknown);

        if has_foreign {
            return parsed.languages.clone();
        }
    }

    vec![Language::English]
}
