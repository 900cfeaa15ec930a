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

use std::sync::Arc;

use searchql_common_exception::Result;
use searchql_query_expression::Row;
use searchql_query_expression::RowRef;

use crate::desc::JoinCondition;
use crate::hash_join_table::HashTable;
use crate::hash_join_table::KeyIndex;
use crate::hash_join_table::RowPtr;
use crate::runtime_filter::PushdownValues;

/// Hash table for an ON clause of OR-ed condition groups.
///
/// Every group indexes the same build rows under its own key. A probe row
/// matches the union of the groups' matches, each build row at most once.
pub struct HashTableGroup {
    indexes: Vec<KeyIndex>,
    rows: Vec<RowRef>,
}

impl HashTableGroup {
    pub fn create(groups: &[Vec<JoinCondition>]) -> Self {
        HashTableGroup::create_with_indexes(
            groups.iter().map(|group| KeyIndex::create(group)).collect(),
        )
    }

    pub(crate) fn create_with_indexes(indexes: Vec<KeyIndex>) -> Self {
        HashTableGroup {
            indexes,
            rows: vec![],
        }
    }

    pub fn num_groups(&self) -> usize {
        self.indexes.len()
    }
}

impl HashTable for HashTableGroup {
    fn name(&self) -> &'static str {
        "HashTableGroup"
    }

    fn add(&mut self, row: Row) -> Result<()> {
        // Extract every key first so a failure leaves all groups untouched.
        let keys = self
            .indexes
            .iter()
            .map(|index| index.build_key(&row))
            .collect::<Result<Vec<_>>>()?;

        let ptr = self.rows.len();
        for (index, key) in self.indexes.iter_mut().zip(keys) {
            index.insert(key, ptr);
        }
        self.rows.push(Arc::new(row));
        Ok(())
    }

    fn probe_ptrs(&self, row: &Row) -> Result<Vec<RowPtr>> {
        let mut ptrs = vec![];
        for index in &self.indexes {
            ptrs.extend_from_slice(index.probe(row)?);
        }
        ptrs.sort_unstable();
        ptrs.dedup();
        Ok(ptrs)
    }

    fn rows(&self) -> &[RowRef] {
        &self.rows
    }

    fn right_field_with_left_values(&self) -> Vec<Vec<PushdownValues>> {
        self.indexes
            .iter()
            .map(|index| index.pushdown_values())
            .collect()
    }

    fn clear(&mut self) {
        for index in self.indexes.iter_mut() {
            index.clear();
        }
        self.rows = vec![];
    }
}
