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

//! Display formatting for listing fields. Everything here is pure and total.

use crate::model::PageWindow;

const ELLIPSIS: &str = "...";
const PHONE_FALLBACK_MASK: &str = "XX##";

/// Renders `$MIN`, `$MIN - $MAX`, optionally suffixed with ` / unit`.
pub fn format_price(min: Option<f64>, max: Option<f64>, unit: Option<&str>) -> Option<String> {
    let min = min.filter(|v| v.is_finite())?;
    let mut out = match max.filter(|v| v.is_finite()) {
        Some(max) if max > min => format!("${min:.2} - ${max:.2}"),
        _ => format!("${min:.2}"),
    };
    if let Some(unit) = unit.filter(|u| !u.is_empty()) {
        out.push_str(" / ");
        out.push_str(unit);
    }
    Some(out)
}

/// Hides the last two digits of a North American number.
///
/// Inputs that are not 10 digits (or 11 with a leading `1`) keep their
/// original text with the last four characters replaced by `XX##`.
pub fn mask_phone(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => format!(
            "({}) {}-{}XX",
            &digits[0..3],
            &digits[3..6],
            &digits[6..8]
        ),
        11 if digits.starts_with('1') => format!(
            "1 ({}) {}-{}XX",
            &digits[1..4],
            &digits[4..7],
            &digits[7..9]
        ),
        _ => {
            let keep = raw.chars().count().saturating_sub(4);
            let mut out: String = raw.chars().take(keep).collect();
            out.push_str(PHONE_FALLBACK_MASK);
            out
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub display: String,
    pub was_truncated: bool,
}

/// Cuts at `max_len` characters, not at a word boundary.
pub fn truncate(text: &str, max_len: usize) -> Truncated {
    match text.char_indices().nth(max_len) {
        None => Truncated {
            display: text.to_string(),
            was_truncated: false,
        },
        Some((cut, _)) => Truncated {
            display: format!("{}{ELLIPSIS}", &text[..cut]),
            was_truncated: true,
        },
    }
}

pub fn compute_window(current: u32, total: u32, size: u32) -> PageWindow {
    let size = i64::from(size.max(1));
    let total_i = i64::from(total);
    let upper = (total_i - size + 1).max(1);
    let start = (i64::from(current) - 2).clamp(1, upper);
    let end = total_i.min(start + size - 1);
    PageWindow {
        current_page: current,
        total_pages: total,
        window_start: start as u32,
        window_end: end.max(0) as u32,
    }
}

pub fn format_distance(miles: Option<f64>) -> Option<String> {
    miles
        .filter(|m| m.is_finite() && *m >= 0.0)
        .map(|m| format!("{m:.1} mi"))
}

pub fn format_location(
    city: Option<&str>,
    state: Option<&str>,
    postal_code: Option<&str>,
) -> Option<String> {
    fn clean(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }
    let region = match (clean(state), clean(postal_code)) {
        (Some(state), Some(zip)) => Some(format!("{state} {zip}")),
        (Some(state), None) => Some(state.to_string()),
        (None, Some(zip)) => Some(zip.to_string()),
        (None, None) => None,
    };
    match (clean(city), region) {
        (Some(city), Some(region)) => Some(format!("{city}, {region}")),
        (Some(city), None) => Some(city.to_string()),
        (None, region) => region,
    }
}
