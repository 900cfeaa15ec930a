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

use crate::hash_join_table::HashTable;
use crate::hash_join_table::RowPtr;
use crate::runtime_filter::PushdownValues;

/// Table for a join without equality conditions: every probe row matches
/// every stored row.
#[derive(Default)]
pub struct ListHashTable {
    rows: Vec<RowRef>,
}

impl ListHashTable {
    pub fn create() -> Self {
        ListHashTable::default()
    }
}

impl HashTable for ListHashTable {
    fn name(&self) -> &'static str {
        "ListHashTable"
    }

    fn add(&mut self, row: Row) -> Result<()> {
        self.rows.push(Arc::new(row));
        Ok(())
    }

    fn probe_ptrs(&self, _row: &Row) -> Result<Vec<RowPtr>> {
        Ok((0..self.rows.len()).collect())
    }

    fn rows(&self) -> &[RowRef] {
        &self.rows
    }

    fn right_field_with_left_values(&self) -> Vec<Vec<PushdownValues>> {
        vec![]
    }

    fn clear(&mut self) {
        self.rows = vec![];
    }
}
