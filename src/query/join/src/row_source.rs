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

use std::collections::VecDeque;

use searchql_common_exception::Result;
use searchql_query_expression::Row;

/// Pull-based supplier of rows, one relation at a time.
pub trait RowSource {
    /// `Ok(None)` once the relation is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>>;
}

pub struct VecRowSource {
    rows: VecDeque<Row>,
}

impl VecRowSource {
    pub fn create(rows: Vec<Row>) -> Self {
        VecRowSource { rows: rows.into() }
    }
}

impl RowSource for VecRowSource {
    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }
}

/// Adapts a fallible iterator, such as a paged scroll over the index.
pub struct IterRowSource<I> {
    inner: I,
}

impl<I> IterRowSource<I>
where I: Iterator<Item = Result<Row>>
{
    pub fn create(inner: I) -> Self {
        IterRowSource { inner }
    }
}

impl<I> RowSource for IterRowSource<I>
where I: Iterator<Item = Result<Row>>
{
    fn next_row(&mut self) -> Result<Option<Row>> {
        self.inner.next().transpose()
    }
}
