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

use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use tracing::warn;
use url::form_urlencoded;

use crate::filter::FilterField;
use crate::filter::assign_field;
use crate::filter::normalize_value;
use crate::model::FilterCriteria;

pub const PARAM_ZIP_CODE: &str = "zipCode";
pub const PARAM_DISTANCE: &str = "distance";
pub const PARAM_CATEGORY: &str = "category";
pub const PARAM_KEYWORD: &str = "keyword";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_LIMIT: &str = "limit";

/// Ordered outbound query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.0.push((key.to_string(), value.into()));
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Decodes a bare query string, a `?`-prefixed one, or a path/URL with a
    /// query component. A trailing `#fragment` is dropped.
    ///
    /// A `?` only separates a query from its locator when the text before it
    /// is a path, a URL, or holds no `=`. Otherwise it belongs to a value.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let split = input.find('?').filter(|&at| {
            let head = &input[..at];
            input.starts_with('/') || has_scheme(head) || !head.contains('=')
        });
        let query = match split {
            Some(at) => &input[at + 1..],
            None if input.contains('=') => input,
            None => "",
        };
        let query = query.split('#').next().unwrap_or_default();
        Self(
            form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQueryBuilder {
    limit: u32,
}

impl SearchQueryBuilder {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn build(&self, criteria: &FilterCriteria, page: u32) -> QueryParams {
        fn text(field: FilterField, value: &Option<String>) -> Option<&str> {
            value.as_deref().and_then(|v| normalize_value(field, v))
        }

        let mut params = QueryParams::default();
        if let Some(zip) = text(FilterField::ZipCode, &criteria.zip_code) {
            params.push(PARAM_ZIP_CODE, zip);
        }
        if let Some(miles) = criteria.max_miles {
            params.push(PARAM_DISTANCE, miles.to_string());
        }
        if let Some(category) = text(FilterField::Category, &criteria.category) {
            params.push(PARAM_CATEGORY, category);
        }
        if let Some(keyword) = text(FilterField::Keyword, &criteria.keyword) {
            params.push(PARAM_KEYWORD, keyword);
        }
        params.push(PARAM_PAGE, page.to_string());
        params.push(PARAM_LIMIT, self.limit.to_string());
        params
    }

    /// Navigable `path?query` for a results page.
    pub fn deep_link(&self, path: &str, criteria: &FilterCriteria, page: u32) -> String {
        format!("{path}?{}", self.build(criteria, page).to_query_string())
    }
}

/// Inverse of [`SearchQueryBuilder::build`] over the criteria fields.
pub fn parse_query(params: &QueryParams) -> Result<FilterCriteria> {
    let mut criteria = FilterCriteria::default();
    for (key, value) in params.iter() {
        let field = match key {
            PARAM_ZIP_CODE => FilterField::ZipCode,
            PARAM_DISTANCE => FilterField::MaxMiles,
            PARAM_CATEGORY => FilterField::Category,
            PARAM_KEYWORD => FilterField::Keyword,
            PARAM_PAGE | PARAM_LIMIT => continue,
            other => {
                warn!(param = other, "ignoring unknown query parameter");
                continue;
            }
        };
        assign_field(&mut criteria, field, value)
            .with_context(|| format!("invalid {key} parameter `{value}`"))?;
    }
    Ok(criteria)
}

pub fn parse_page(params: &QueryParams) -> Result<u32> {
    let Some(raw) = params.get(PARAM_PAGE) else {
        return Ok(1);
    };
    let page: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid page parameter `{raw}`"))?;
    if page == 0 {
        anyhow::bail!("page numbers start at 1");
    }
    Ok(page)
}

fn has_scheme(head: &str) -> bool {
    head.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}
