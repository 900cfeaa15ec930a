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

use searchql_common_exception::Result;
use searchql_query_expression::Row;
use searchql_query_expression::RowRef;

use crate::runtime_filter::PushdownValues;

/// Position of a build row in insertion order.
pub type RowPtr = usize;

/// Build-side index of a hash join.
///
/// A table is filled by `add` during the build phase and only read during
/// the probe phase. Stored rows keep their insertion order, which is also the
/// order of every match result.
pub trait HashTable: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stores one build row. Rows whose key has a NULL component are kept
    /// but never matched.
    fn add(&mut self, row: Row) -> Result<()>;

    /// Pointers of the stored rows matching the probe row, ascending.
    fn probe_ptrs(&self, row: &Row) -> Result<Vec<RowPtr>>;

    /// All stored rows matching the probe row, in insertion order.
    fn probe(&self, row: &Row) -> Result<Vec<RowRef>> {
        let rows = self.rows();
        Ok(self
            .probe_ptrs(row)?
            .into_iter()
            .filter_map(|ptr| rows.get(ptr).cloned())
            .collect())
    }

    /// All stored rows in insertion order, matchable or not.
    fn rows(&self) -> &[RowRef];

    /// The pushdown filter of the table, one entry per OR-ed condition group.
    ///
    /// Inside a group there is one entry per key position: the probe-side
    /// field and the distinct build-side values seen at that position. The
    /// entries of a group are AND-ed. No group at all means the table cannot
    /// constrain the probe side.
    fn right_field_with_left_values(&self) -> Vec<Vec<PushdownValues>>;

    fn size(&self) -> usize {
        self.rows().len()
    }

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn clear(&mut self);
}
