// Copyright 2021 Datafuse Labs
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

use std::time::Instant;

use ahash::AHashSet;
use searchql_query_expression::Row;
use searchql_query_expression::Scalar;

use crate::hash_join_table::HashTable;
use crate::join_key::JoinKey;

/// Distinct build-side values of one key position, keyed by the probe-side
/// field they constrain.
///
/// It is a necessary filter only: probe rows passing `field IN (values)`
/// still go through the exact match against the hash table.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PushdownValues {
    pub field: String,
    pub values: Vec<Scalar>,
}

impl PushdownValues {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Collects, per key position, the distinct values of the keys it is fed,
/// in first-seen order. Keys with a NULL component are ignored since they
/// can never match.
pub struct PushdownKeyCollector {
    fields: Vec<String>,
    seen: Vec<AHashSet<Scalar>>,
    values: Vec<Vec<Scalar>>,
}

impl PushdownKeyCollector {
    pub fn create(probe_fields: &[String]) -> Self {
        PushdownKeyCollector {
            fields: probe_fields.to_vec(),
            seen: vec![AHashSet::new(); probe_fields.len()],
            values: vec![vec![]; probe_fields.len()],
        }
    }

    pub fn collect(&mut self, key: &JoinKey) {
        if key.has_null() {
            return;
        }

        for ((seen, values), value) in self
            .seen
            .iter_mut()
            .zip(self.values.iter_mut())
            .zip(key.values())
        {
            if seen.insert(value.clone()) {
                values.push(value.clone());
            }
        }
    }

    pub fn finish(self) -> Vec<PushdownValues> {
        self.fields
            .into_iter()
            .zip(self.values)
            .map(|(field, values)| PushdownValues { field, values })
            .collect()
    }
}

/// The filters handed to the probe side once the build phase is over.
///
/// `groups` are OR-ed; the entries inside one group are AND-ed. No group
/// means the probe side is not filtered.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PushdownPacket {
    pub build_rows: usize,
    pub groups: Vec<Vec<PushdownValues>>,
    /// Probe fields whose value set exceeded the threshold and was dropped.
    pub disabled_fields: Vec<String>,
}

/// Evaluates `(f1 IN (..) AND f2 IN (..)) OR (..)` against a row, the way
/// the probe-side backend applies the pushed filters. A row without the
/// field or with a NULL value is not in any value set.
pub fn eval_pushdown_filters(groups: &[Vec<PushdownValues>], row: &Row) -> bool {
    if groups.is_empty() {
        return true;
    }

    groups.iter().any(|group| {
        group.iter().all(|filter| match row.get(&filter.field) {
            Some(value) if !value.is_null() => filter.values.contains(value),
            _ => false,
        })
    })
}

/// Derives the pushdown filters from a built table.
///
/// A key position with more than `values_threshold` distinct values is left
/// out of its group, which only weakens that group. A group left without any
/// position would let every probe row through, so the whole filter is then
/// dropped.
pub fn build_pushdown_packet(hash_table: &dyn HashTable, values_threshold: u64) -> PushdownPacket {
    let start = Instant::now();
    let build_rows = hash_table.size();

    let mut groups = vec![];
    let mut disabled_fields = vec![];
    let mut unconstrained = false;
    for group in hash_table.right_field_with_left_values() {
        let (kept, dropped): (Vec<_>, Vec<_>) = group
            .into_iter()
            .partition(|values| values.len() as u64 <= values_threshold);

        for values in dropped {
            log::info!(
                "JOIN-PUSHDOWN: Disable filter on {} - {} distinct values > threshold {}",
                values.field,
                values.len(),
                values_threshold
            );
            disabled_fields.push(values.field);
        }

        if kept.is_empty() {
            unconstrained = true;
        } else {
            groups.push(kept);
        }
    }

    if unconstrained {
        log::info!("JOIN-PUSHDOWN: A condition group has no filter left, skip pushdown");
        groups.clear();
    }

    log::info!(
        "JOIN-PUSHDOWN: Built {} filter groups in {:?} for {} rows",
        groups.len(),
        start.elapsed(),
        build_rows
    );

    PushdownPacket {
        build_rows,
        groups,
        disabled_fields,
    }
}
