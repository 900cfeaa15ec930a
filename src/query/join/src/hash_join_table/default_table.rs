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

/// Hash table for an ON clause made of AND-ed equalities.
///
/// `left_field` of each condition is read from build rows, `right_field`
/// from probe rows.
pub struct DefaultHashTable {
    index: KeyIndex,
    rows: Vec<RowRef>,
}

impl DefaultHashTable {
    pub fn create(conditions: &[JoinCondition]) -> Self {
        DefaultHashTable::create_with_index(KeyIndex::create(conditions))
    }

    pub(crate) fn create_with_index(index: KeyIndex) -> Self {
        DefaultHashTable {
            index,
            rows: vec![],
        }
    }

    /// Number of distinct matchable keys.
    pub fn num_keys(&self) -> usize {
        self.index.num_keys()
    }
}

impl HashTable for DefaultHashTable {
    fn name(&self) -> &'static str {
        "DefaultHashTable"
    }

    fn add(&mut self, row: Row) -> Result<()> {
        let key = self.index.build_key(&row)?;
        self.index.insert(key, self.rows.len());
        self.rows.push(Arc::new(row));
        Ok(())
    }

    fn probe_ptrs(&self, row: &Row) -> Result<Vec<RowPtr>> {
        Ok(self.index.probe(row)?.to_vec())
    }

    fn rows(&self) -> &[RowRef] {
        &self.rows
    }

    fn right_field_with_left_values(&self) -> Vec<Vec<PushdownValues>> {
        vec![self.index.pushdown_values()]
    }

    fn clear(&mut self) {
        self.index.clear();
        self.rows = vec![];
    }
}
