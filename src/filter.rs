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

//! Filter form state: an applied criteria value, an editable draft, and the
//! debounce that decides when the draft takes effect.
//!
//! The debounce is a single deadline. Every edit replaces it, so bursts of
//! edits coalesce into one firing. The host drives time by calling
//! [`FilterStateController::poll`].

use std::str::FromStr;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::model::FilterCriteria;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

const UNCONSTRAINED: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyPolicy {
    /// Non-keyword edits apply at once; keyword edits apply after the debounce.
    AutoApply,
    /// Nothing applies until `apply_now`; the debounce only flags pending changes.
    ExplicitApply,
}

impl FromStr for ApplyPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "auto_apply" => Ok(ApplyPolicy::AutoApply),
            "explicit" | "explicit_apply" => Ok(ApplyPolicy::ExplicitApply),
            other => anyhow::bail!("unknown apply policy `{other}` (expected auto or explicit)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    ZipCode,
    MaxMiles,
    Category,
    Keyword,
}

impl FromStr for FilterField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zipCode" | "zip_code" | "zip" => Ok(FilterField::ZipCode),
            "maxMiles" | "max_miles" | "distance" => Ok(FilterField::MaxMiles),
            "category" => Ok(FilterField::Category),
            "keyword" => Ok(FilterField::Keyword),
            other => anyhow::bail!("unknown filter field `{other}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyEvent {
    pub sequence: u64,
    pub criteria: FilterCriteria,
}

#[derive(Debug, Clone)]
pub struct FilterStateController {
    policy: ApplyPolicy,
    debounce: Duration,
    applied: FilterCriteria,
    draft: FilterCriteria,
    pending_changes: bool,
    deadline: Option<Instant>,
    sequence: u64,
}

impl FilterStateController {
    pub fn new(policy: ApplyPolicy) -> Self {
        Self::with_debounce(policy, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(policy: ApplyPolicy, debounce: Duration) -> Self {
        Self::with_initial(policy, debounce, FilterCriteria::default())
    }

    /// Starts from criteria that are already in effect, e.g. from a deep link.
    pub fn with_initial(policy: ApplyPolicy, debounce: Duration, initial: FilterCriteria) -> Self {
        Self {
            policy,
            debounce,
            applied: initial.clone(),
            draft: initial,
            pending_changes: false,
            deadline: None,
            sequence: 0,
        }
    }

    pub fn policy(&self) -> ApplyPolicy {
        self.policy
    }

    pub fn applied(&self) -> &FilterCriteria {
        &self.applied
    }

    pub fn draft(&self) -> &FilterCriteria {
        &self.draft
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending_changes
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Updates one draft field from its form value, then reconciles.
    ///
    /// Returns an apply event when the edit takes effect immediately.
    pub fn set_draft_field(
        &mut self,
        field: FilterField,
        value: &str,
        now: Instant,
    ) -> Result<Option<ApplyEvent>> {
        assign_field(&mut self.draft, field, value)?;
        Ok(self.reconcile(field, now))
    }

    pub fn reconcile(&mut self, field: FilterField, now: Instant) -> Option<ApplyEvent> {
        match (self.policy, field) {
            (ApplyPolicy::AutoApply, FilterField::Keyword) | (ApplyPolicy::ExplicitApply, _) => {
                self.schedule(now);
                None
            }
            (ApplyPolicy::AutoApply, _) => Some(self.apply_now()),
        }
    }

    /// Fires the debounce if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<ApplyEvent> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        debug!(policy = ?self.policy, "filter debounce fired");
        match self.policy {
            ApplyPolicy::AutoApply => Some(self.apply_now()),
            ApplyPolicy::ExplicitApply => {
                self.pending_changes = true;
                None
            }
        }
    }

    pub fn apply_now(&mut self) -> ApplyEvent {
        self.deadline = None;
        self.pending_changes = false;
        self.applied = self.draft.clone();
        self.emit()
    }

    pub fn clear_all(&mut self) -> ApplyEvent {
        self.draft = FilterCriteria::default();
        self.apply_now()
    }

    fn schedule(&mut self, now: Instant) {
        let restarted = self.deadline.is_some();
        self.deadline = Some(now + self.debounce);
        debug!(
            restarted,
            debounce_ms = self.debounce.as_millis() as u64,
            "filter debounce scheduled"
        );
    }

    fn emit(&mut self) -> ApplyEvent {
        self.sequence += 1;
        debug!(sequence = self.sequence, criteria = ?self.applied, "filters applied");
        ApplyEvent {
            sequence: self.sequence,
            criteria: self.applied.clone(),
        }
    }
}

/// Writes one raw form or query value into `criteria`.
///
/// A bad `maxMiles` number leaves `criteria` untouched.
pub fn assign_field(criteria: &mut FilterCriteria, field: FilterField, value: &str) -> Result<()> {
    let value = normalize_value(field, value);
    match field {
        FilterField::ZipCode => criteria.zip_code = value.map(str::to_string),
        FilterField::MaxMiles => {
            criteria.max_miles = value
                .map(|v| {
                    v.parse::<u32>()
                        .with_context(|| format!("invalid maxMiles value `{v}`"))
                })
                .transpose()?;
        }
        FilterField::Category => criteria.category = value.map(str::to_string),
        FilterField::Keyword => criteria.keyword = value.map(str::to_string),
    }
    Ok(())
}

/// Trims `value`; empty means unconstrained, and so does `"all"` for the
/// category and radius fields.
pub fn normalize_value(field: FilterField, value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let allows_all = matches!(field, FilterField::Category | FilterField::MaxMiles);
    if allows_all && value.eq_ignore_ascii_case(UNCONSTRAINED) {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn auto_mode_applies_non_keyword_fields_immediately() {
        let t0 = Instant::now();
        let mut ctl = FilterStateController::new(ApplyPolicy::AutoApply);
        let event = ctl
            .set_draft_field(FilterField::Category, "Plumbing", t0)
            .expect("set")
            .expect("applied");
        assert_eq!(event.sequence, 1);
        assert_eq!(ctl.applied().category.as_deref(), Some("Plumbing"));
        assert_eq!(ctl.deadline(), None);
    }

    #[test]
    fn keyword_edits_coalesce_into_one_apply() {
        let t0 = Instant::now();
        let mut ctl = FilterStateController::new(ApplyPolicy::AutoApply);
        let mut events = Vec::new();
        for (i, text) in ["p", "pi", "piz", "pizz", "pizza"].iter().enumerate() {
            let now = t0 + ms(100 * i as u64);
            assert!(ctl.set_draft_field(FilterField::Keyword, text, now).expect("set").is_none());
            events.extend(ctl.poll(now));
        }
        // last edit at 400 ms; nothing fires before 900 ms
        events.extend(ctl.poll(t0 + ms(899)));
        assert!(events.is_empty());
        events.extend(ctl.poll(t0 + ms(900)));
        events.extend(ctl.poll(t0 + ms(5000)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].criteria.keyword.as_deref(), Some("pizza"));
        assert_eq!(ctl.applied(), ctl.draft());
    }

    #[test]
    fn non_keyword_edit_flushes_pending_keyword() {
        let t0 = Instant::now();
        let mut ctl = FilterStateController::new(ApplyPolicy::AutoApply);
        ctl.set_draft_field(FilterField::Keyword, "tacos", t0).expect("set");
        let event = ctl
            .set_draft_field(FilterField::ZipCode, "97201", t0 + ms(100))
            .expect("set")
            .expect("applied");
        assert_eq!(event.criteria.keyword.as_deref(), Some("tacos"));
        assert!(ctl.poll(t0 + ms(1000)).is_none());
    }

    #[test]
    fn explicit_mode_never_auto_applies() {
        let t0 = Instant::now();
        let mut ctl = FilterStateController::new(ApplyPolicy::ExplicitApply);
        assert!(ctl.set_draft_field(FilterField::Category, "Bakery", t0).expect("set").is_none());
        assert!(!ctl.has_pending_changes());
        assert!(ctl.poll(t0 + ms(499)).is_none());
        assert!(!ctl.has_pending_changes());
        assert!(ctl.poll(t0 + ms(500)).is_none());
        assert!(ctl.has_pending_changes());
        assert!(ctl.applied().is_empty());
        assert_eq!(ctl.draft().category.as_deref(), Some("Bakery"));

        let event = ctl.apply_now();
        assert_eq!(event.criteria.category.as_deref(), Some("Bakery"));
        assert!(!ctl.has_pending_changes());
        assert_eq!(ctl.applied(), ctl.draft());
    }

    #[test]
    fn clear_all_applies_empty_in_both_modes() {
        for policy in [ApplyPolicy::AutoApply, ApplyPolicy::ExplicitApply] {
            let t0 = Instant::now();
            let mut ctl = FilterStateController::new(policy);
            ctl.set_draft_field(FilterField::Keyword, "bikes", t0).expect("set");
            ctl.set_draft_field(FilterField::MaxMiles, "25", t0).expect("set");
            ctl.poll(t0 + ms(600));
            let event = ctl.clear_all();
            assert!(event.criteria.is_empty());
            assert!(ctl.applied().is_empty());
            assert!(ctl.draft().is_empty());
            assert!(!ctl.has_pending_changes());
            assert_eq!(ctl.deadline(), None);
        }
    }

    #[test]
    fn all_and_empty_mean_unconstrained() {
        let t0 = Instant::now();
        let mut ctl = FilterStateController::new(ApplyPolicy::ExplicitApply);
        ctl.set_draft_field(FilterField::MaxMiles, "50", t0).expect("set");
        ctl.set_draft_field(FilterField::Category, "Auto", t0).expect("set");
        ctl.set_draft_field(FilterField::MaxMiles, "all", t0).expect("set");
        ctl.set_draft_field(FilterField::Category, "ALL", t0).expect("set");
        assert_eq!(ctl.draft().max_miles, None);
        assert_eq!(ctl.draft().category, None);

        // "all" is a literal keyword, not a sentinel
        ctl.set_draft_field(FilterField::Keyword, "all", t0).expect("set");
        assert_eq!(ctl.draft().keyword.as_deref(), Some("all"));
        ctl.set_draft_field(FilterField::Keyword, "  ", t0).expect("set");
        assert_eq!(ctl.draft().keyword, None);
    }

    #[test]
    fn invalid_miles_is_rejected_without_touching_draft() {
        let t0 = Instant::now();
        let mut ctl = FilterStateController::new(ApplyPolicy::AutoApply);
        ctl.set_draft_field(FilterField::MaxMiles, "15", t0).expect("set");
        let err = ctl
            .set_draft_field(FilterField::MaxMiles, "far", t0)
            .unwrap_err();
        assert!(err.to_string().contains("invalid maxMiles"));
        assert_eq!(ctl.draft().max_miles, Some(15));
        assert_eq!(ctl.applied().max_miles, Some(15));
    }

    #[test]
    fn latest_apply_wins() {
        let t0 = Instant::now();
        let mut ctl = FilterStateController::new(ApplyPolicy::AutoApply);
        ctl.set_draft_field(FilterField::Category, "A", t0).expect("set");
        let second = ctl
            .set_draft_field(FilterField::Category, "B", t0)
            .expect("set")
            .expect("applied");
        assert_eq!(second.sequence, 2);
        assert_eq!(ctl.applied().category.as_deref(), Some("B"));
    }

    #[test]
    fn parses_policy_and_field_names() {
        assert_eq!("auto".parse::<ApplyPolicy>().unwrap(), ApplyPolicy::AutoApply);
        assert_eq!(
            "Explicit".parse::<ApplyPolicy>().unwrap(),
            ApplyPolicy::ExplicitApply
        );
        assert!("sometimes".parse::<ApplyPolicy>().is_err());
        assert_eq!("distance".parse::<FilterField>().unwrap(), FilterField::MaxMiles);
        assert!("color".parse::<FilterField>().is_err());
    }
}
