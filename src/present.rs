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

//! Turns a raw search response into renderable listing view models.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::classify::classify;
use crate::format::compute_window;
use crate::format::format_distance;
use crate::format::format_location;
use crate::format::format_price;
use crate::format::mask_phone;
use crate::format::truncate;
use crate::model::ListingKind;
use crate::model::ListingRecord;
use crate::model::ListingViewModel;
use crate::model::PageWindow;
use crate::model::SearchResponse;

pub const DEFAULT_NARRATIVE_MAX_LEN: usize = 150;
pub const DEFAULT_WINDOW_SIZE: u32 = 5;

/// Listing ids whose narrative is shown in full.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NarrativeExpansionSet(BTreeSet<String>);

impl NarrativeExpansionSet {
    /// Returns whether `id` is expanded after the flip.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.0.remove(id) {
            false
        } else {
            self.0.insert(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

pub fn present(
    records: &[ListingRecord],
    expanded: &NarrativeExpansionSet,
    narrative_max_len: usize,
) -> Vec<ListingViewModel> {
    records
        .iter()
        .map(|record| present_one(record, expanded.contains(record.id()), narrative_max_len))
        .collect()
}

fn present_one(
    record: &ListingRecord,
    expanded: bool,
    narrative_max_len: usize,
) -> ListingViewModel {
    let common = &record.common;
    let badge = classify(record);
    let price_display = record
        .pricing()
        .and_then(|p| format_price(p.min_price, p.max_price, p.price_unit.as_deref()));
    let masked_phone = common
        .phone_number
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|phone| match record.kind {
            ListingKind::ClassifiedAd(_) => mask_phone(phone),
            _ => phone.to_string(),
        });

    let narrative = common.description.as_deref().unwrap_or_default();
    let (narrative_display, narrative_truncated) = if expanded {
        (narrative.to_string(), false)
    } else {
        let t = truncate(narrative, narrative_max_len);
        (t.display, t.was_truncated)
    };

    ListingViewModel {
        id: common.external_id.clone(),
        title: common.title.clone(),
        business_name: common.business_name.clone(),
        badge_label: badge.label,
        badge_icon_kind: badge.icon,
        price_display,
        masked_phone,
        distance_display: format_distance(common.distance_miles),
        location_display: format_location(
            common.city.as_deref(),
            common.state.as_deref(),
            common.postal_code.as_deref(),
        ),
        narrative_display,
        narrative_truncated,
        narrative_expanded: expanded,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultState {
    Empty,
    Loaded(SearchResponse),
    /// The fetch failed; no results are shown in its place.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SearchResultPresenter {
    state: ResultState,
    expanded: NarrativeExpansionSet,
    narrative_max_len: usize,
    window_size: u32,
}

impl Default for SearchResultPresenter {
    fn default() -> Self {
        Self::new(DEFAULT_NARRATIVE_MAX_LEN, DEFAULT_WINDOW_SIZE)
    }
}

impl SearchResultPresenter {
    pub fn new(narrative_max_len: usize, window_size: u32) -> Self {
        Self {
            state: ResultState::Empty,
            expanded: NarrativeExpansionSet::default(),
            narrative_max_len,
            window_size,
        }
    }

    pub fn state(&self) -> &ResultState {
        &self.state
    }

    pub fn expanded(&self) -> &NarrativeExpansionSet {
        &self.expanded
    }

    /// Installs a new result set. Responses are taken in arrival order, so a
    /// late response to an older query still replaces the current one.
    pub fn replace_results(&mut self, response: SearchResponse) {
        self.reset_expansion();
        debug!(
            results = response.results.len(),
            page = response.current_page,
            "result set replaced"
        );
        self.state = ResultState::Loaded(response);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.reset_expansion();
        let message = message.into();
        debug!(%message, "search failed");
        self.state = ResultState::Failed(message);
    }

    pub fn toggle_narrative(&mut self, id: &str) -> bool {
        self.expanded.toggle(id)
    }

    pub fn view_models(&self) -> Vec<ListingViewModel> {
        match &self.state {
            ResultState::Loaded(response) => {
                present(&response.results, &self.expanded, self.narrative_max_len)
            }
            ResultState::Empty | ResultState::Failed(_) => Vec::new(),
        }
    }

    pub fn page_window(&self) -> Option<PageWindow> {
        match &self.state {
            ResultState::Loaded(response) => Some(compute_window(
                response.current_page,
                response.total_pages,
                self.window_size,
            )),
            ResultState::Empty | ResultState::Failed(_) => None,
        }
    }

    fn reset_expansion(&mut self) {
        if !self.expanded.is_empty() {
            debug!(cleared = self.expanded.len(), "narrative expansion reset");
        }
        self.expanded.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::IconKind;

    fn response(ids: &[&str], description: &str) -> SearchResponse {
        let results: Vec<_> = ids
            .iter()
            .map(|id| {
                json!({
                    "recordType": "SERVICE",
                    "externalId": id,
                    "title": format!("Listing {id}"),
                    "description": description,
                    "minPrice": 40,
                    "maxPrice": 60,
                    "priceUnit": "visit",
                    "phoneNumber": "5551234567"
                })
            })
            .collect();
        serde_json::from_value(json!({
            "results": results,
            "totalCount": ids.len(),
            "currentPage": 1,
            "totalPages": 1
        }))
        .expect("response")
    }

    #[test]
    fn formats_priced_listing() {
        let resp = response(&["a"], "short");
        let vms = present(&resp.results, &NarrativeExpansionSet::default(), 150);
        let vm = &vms[0];
        assert_eq!(vm.badge_label, "Service");
        assert_eq!(vm.badge_icon_kind, IconKind::Wrench);
        assert_eq!(vm.price_display.as_deref(), Some("$40.00 - $60.00 / visit"));
        // only classified ads are masked
        assert_eq!(vm.masked_phone.as_deref(), Some("5551234567"));
        assert_eq!(vm.narrative_display, "short");
        assert!(!vm.narrative_truncated);
    }

    #[test]
    fn classified_phone_is_masked_and_profile_has_no_price() {
        let records: Vec<ListingRecord> = serde_json::from_value(json!([
            {"recordType": "CLASSIFIED_AD", "externalId": "c", "title": "Couch",
             "phoneNumber": "1-555-123-4567", "minPrice": 100},
            {"recordType": "BUSINESS_PROFILE", "externalId": "b", "title": "Shop",
             "minPrice": 5, "phoneNumber": "5551234567"}
        ]))
        .expect("records");
        let vms = present(&records, &NarrativeExpansionSet::default(), 150);
        assert_eq!(vms[0].masked_phone.as_deref(), Some("1 (555) 123-45XX"));
        assert_eq!(vms[0].price_display.as_deref(), Some("$100.00"));
        assert_eq!(vms[1].price_display, None);
        assert_eq!(vms[1].badge_label, "Pro");
        assert_eq!(vms[1].masked_phone.as_deref(), Some("5551234567"));
    }

    #[test]
    fn expansion_shows_full_narrative() {
        let long = "x".repeat(300);
        let mut presenter = SearchResultPresenter::new(200, 5);
        presenter.replace_results(response(&["a", "b"], &long));
        assert!(presenter.toggle_narrative("a"));
        let vms = presenter.view_models();
        assert_eq!(vms[0].narrative_display.len(), 300);
        assert!(vms[0].narrative_expanded);
        assert!(vms[1].narrative_truncated);
        assert_eq!(vms[1].narrative_display.len(), 203);

        assert!(!presenter.toggle_narrative("a"));
        assert!(presenter.view_models()[0].narrative_truncated);
    }

    #[test]
    fn new_results_reset_expansion() {
        let long = "y".repeat(200);
        let mut presenter = SearchResultPresenter::default();
        presenter.replace_results(response(&["a", "b"], &long));
        presenter.toggle_narrative("a");
        presenter.toggle_narrative("b");
        assert_eq!(presenter.expanded().len(), 2);

        // same ids in the new set must not inherit expansion
        presenter.replace_results(response(&["a", "c"], &long));
        assert!(presenter.expanded().is_empty());
        assert!(presenter.view_models().iter().all(|vm| vm.narrative_truncated));
    }

    #[test]
    fn failure_is_explicit_and_empty() {
        let mut presenter = SearchResultPresenter::default();
        presenter.replace_results(response(&["a"], "d"));
        presenter.toggle_narrative("a");
        presenter.fail("connection refused");
        assert_eq!(
            presenter.state(),
            &ResultState::Failed("connection refused".to_string())
        );
        assert!(presenter.view_models().is_empty());
        assert!(presenter.page_window().is_none());
        assert!(presenter.expanded().is_empty());
    }

    #[test]
    fn page_window_follows_response() {
        let mut presenter = SearchResultPresenter::default();
        let mut resp = response(&["a"], "d");
        resp.current_page = 5;
        resp.total_pages = 20;
        presenter.replace_results(resp);
        let window = presenter.page_window().expect("window");
        assert_eq!((window.window_start, window.window_end), (3, 7));
    }
}
