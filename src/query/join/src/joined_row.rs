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
use searchql_query_expression::Scalar;

use crate::desc::BuildSide;

/// One output pair of the join.
///
/// `probe` is `None` only for a LEFT OUTER build row that matched nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinedRow {
    pub build: RowRef,
    pub probe: Option<RowRef>,
    pub build_side: BuildSide,
}

impl JoinedRow {
    pub fn create(build: RowRef, probe: Option<RowRef>, build_side: BuildSide) -> Self {
        JoinedRow {
            build,
            probe,
            build_side,
        }
    }

    pub fn left(&self) -> Option<&RowRef> {
        match self.build_side {
            BuildSide::Left => Some(&self.build),
            BuildSide::Right => self.probe.as_ref(),
        }
    }

    pub fn right(&self) -> Option<&RowRef> {
        match self.build_side {
            BuildSide::Left => self.probe.as_ref(),
            BuildSide::Right => Some(&self.build),
        }
    }

    /// Flattens the pair into one row named `alias.field`, left fields first.
    /// A missing side contributes no fields.
    pub fn combine(&self, left_alias: &str, right_alias: &str) -> Result<Row> {
        let mut pairs: Vec<(String, Scalar)> = vec![];
        for (alias, side) in [(left_alias, self.left()), (right_alias, self.right())] {
            if let Some(row) = side {
                pairs.extend(
                    row.iter()
                        .map(|(name, value)| (format!("{}.{}", alias, name), value.clone())),
                );
            }
        }
        Row::from_pairs(pairs)
    }
}
