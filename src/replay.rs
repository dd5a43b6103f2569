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

//! Replays a timestamped log of filter edits through a controller on a
//! virtual clock and records every apply it emits.

use std::io::BufRead;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::filter::ApplyEvent;
use crate::filter::ApplyPolicy;
use crate::filter::FilterField;
use crate::filter::FilterStateController;
use crate::model::FilterCriteria;
use crate::query::SearchQueryBuilder;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub op: ScriptOp,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    Set { field: String, value: String },
    Apply,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Immediate,
    Debounce,
    Apply,
    Clear,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedAt {
    pub at_ms: u64,
    pub trigger: Trigger,
    pub sequence: u64,
    pub criteria: FilterCriteria,
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub policy: ApplyPolicy,
    pub applies: Vec<AppliedAt>,
    pub applied: FilterCriteria,
    pub draft: FilterCriteria,
    pub pending_changes: bool,
}

pub fn read_script(reader: impl BufRead) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("read replay script")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let step: ScriptStep = serde_json::from_str(trimmed)
            .with_context(|| format!("parse replay script line {}", idx + 1))?;
        steps.push(step);
    }
    Ok(steps)
}

pub fn replay(
    steps: &[ScriptStep],
    policy: ApplyPolicy,
    debounce: Duration,
    builder: &SearchQueryBuilder,
) -> Result<ReplayReport> {
    let base = Instant::now();
    let mut controller = FilterStateController::with_debounce(policy, debounce);
    let mut recorder = Recorder {
        base,
        builder,
        applies: Vec::new(),
    };
    let mut last_ms = 0u64;

    for step in steps {
        if step.at_ms < last_ms {
            anyhow::bail!(
                "replay script goes back in time ({} ms after {} ms)",
                step.at_ms,
                last_ms
            );
        }
        last_ms = step.at_ms;
        let now = base + Duration::from_millis(step.at_ms);
        fire_due(&mut controller, now, &mut recorder);

        match &step.op {
            ScriptOp::Set { field, value } => {
                let field: FilterField = field.parse()?;
                let emitted = controller
                    .set_draft_field(field, value, now)
                    .with_context(|| format!("step at {} ms", step.at_ms))?;
                if let Some(event) = emitted {
                    recorder.record(now, Trigger::Immediate, event);
                }
            }
            ScriptOp::Apply => {
                let event = controller.apply_now();
                recorder.record(now, Trigger::Apply, event);
            }
            ScriptOp::Clear => {
                let event = controller.clear_all();
                recorder.record(now, Trigger::Clear, event);
            }
        }
    }

    if let Some(deadline) = controller.deadline() {
        fire_due(&mut controller, deadline, &mut recorder);
    }

    Ok(ReplayReport {
        policy: controller.policy(),
        applies: recorder.applies,
        applied: controller.applied().clone(),
        draft: controller.draft().clone(),
        pending_changes: controller.has_pending_changes(),
    })
}

struct Recorder<'a> {
    base: Instant,
    builder: &'a SearchQueryBuilder,
    applies: Vec<AppliedAt>,
}

impl Recorder<'_> {
    fn record(&mut self, at: Instant, trigger: Trigger, event: ApplyEvent) {
        // A fresh filter set always starts from the first page.
        let query = self.builder.build(&event.criteria, 1).to_query_string();
        self.applies.push(AppliedAt {
            at_ms: at.duration_since(self.base).as_millis() as u64,
            trigger,
            sequence: event.sequence,
            criteria: event.criteria,
            query,
        });
    }
}

fn fire_due(controller: &mut FilterStateController, now: Instant, recorder: &mut Recorder<'_>) {
    let Some(deadline) = controller.deadline() else {
        return;
    };
    if let Some(event) = controller.poll(now) {
        recorder.record(deadline, Trigger::Debounce, event);
    }
}
