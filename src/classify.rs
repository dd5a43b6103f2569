// Copyright 2026 Bizsearch Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::model::Badge;
use crate::model::IconKind;
use crate::model::ListingKind;
use crate::model::ListingRecord;

const PROFILE_FALLBACK_LABEL: &str = "Pro";

/// Badge for a listing. Looks only at the record type and, for business
/// profiles, the category name.
pub fn classify(record: &ListingRecord) -> Badge {
    let (label, icon) = match &record.kind {
        ListingKind::BusinessProfile { category_name } => (
            category_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(PROFILE_FALLBACK_LABEL),
            IconKind::Store,
        ),
        ListingKind::Service(_) => ("Service", IconKind::Wrench),
        ListingKind::Product(_) => ("Product", IconKind::Package),
        ListingKind::ClassifiedAd(_) => ("Classified", IconKind::Tag),
        ListingKind::Other => ("Other", IconKind::Building),
    };
    Badge {
        label: label.to_string(),
        icon,
    }
}
