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

use std::fmt::Display;
use std::fmt::Formatter;

use itertools::Itertools;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;
use searchql_query_expression::RowSchemaRef;
use searchql_query_settings::JoinBuildSide;

use crate::hash_join_table::DefaultHashTable;
use crate::hash_join_table::HashTable;
use crate::hash_join_table::HashTableGroup;
use crate::hash_join_table::KeyIndex;
use crate::hash_join_table::ListHashTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum JoinType {
    Inner,
    LeftOuter,
}

impl Display for JoinType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::LeftOuter => write!(f, "LEFT OUTER"),
        }
    }
}

/// The relation loaded into the hash table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum BuildSide {
    Left,
    Right,
}

/// One equality `left_field = right_field` of the ON clause.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct JoinCondition {
    pub left_field: String,
    pub right_field: String,
}

impl JoinCondition {
    pub fn create(left_field: impl Into<String>, right_field: impl Into<String>) -> Self {
        JoinCondition {
            left_field: left_field.into(),
            right_field: right_field.into(),
        }
    }

    fn flip(&self) -> Self {
        JoinCondition {
            left_field: self.right_field.clone(),
            right_field: self.left_field.clone(),
        }
    }
}

impl Display for JoinCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.left_field, self.right_field)
    }
}

/// Physical description of a hash join, produced by the planner.
///
/// `condition_groups` is the ON clause in disjunctive form: the groups are
/// OR-ed and the conditions inside a group are AND-ed. No group at all means
/// a cross join.
#[derive(Clone, Debug)]
pub struct HashJoinDesc {
    pub join_type: JoinType,
    pub condition_groups: Vec<Vec<JoinCondition>>,
    pub build_side: BuildSide,
    pub left_schema: Option<RowSchemaRef>,
    pub right_schema: Option<RowSchemaRef>,
}

impl HashJoinDesc {
    pub fn try_create(
        join_type: JoinType,
        condition_groups: Vec<Vec<JoinCondition>>,
    ) -> Result<HashJoinDesc> {
        if condition_groups.iter().any(|group| group.is_empty()) {
            return Err(ErrorCode::BadArguments(
                "Join condition group must contain at least one equality".to_string(),
            ));
        }

        Ok(HashJoinDesc {
            join_type,
            condition_groups,
            build_side: BuildSide::Left,
            left_schema: None,
            right_schema: None,
        })
    }

    /// Single conjunction `l1 = r1 AND l2 = r2 ...`.
    pub fn try_create_with_conditions(
        join_type: JoinType,
        conditions: Vec<JoinCondition>,
    ) -> Result<HashJoinDesc> {
        HashJoinDesc::try_create(join_type, vec![conditions])
    }

    pub fn with_build_side(mut self, build_side: BuildSide) -> Result<HashJoinDesc> {
        if self.join_type == JoinType::LeftOuter && build_side == BuildSide::Right {
            return Err(ErrorCode::BadArguments(
                "LEFT OUTER join must build the hash table from the left relation".to_string(),
            ));
        }
        self.build_side = build_side;
        Ok(self)
    }

    /// Known schemas let key fields be checked when the plan is built.
    pub fn with_schemas(mut self, left: RowSchemaRef, right: RowSchemaRef) -> HashJoinDesc {
        self.left_schema = Some(left);
        self.right_schema = Some(right);
        self
    }

    /// Picks the build side from the session preference and row estimates.
    ///
    /// `auto` builds the smaller relation when both estimates are known and
    /// the left one otherwise. LEFT OUTER joins always build the left side.
    pub fn choose_build_side(
        &self,
        preference: JoinBuildSide,
        left_rows: Option<u64>,
        right_rows: Option<u64>,
    ) -> BuildSide {
        if self.join_type == JoinType::LeftOuter {
            return BuildSide::Left;
        }

        match (preference, left_rows, right_rows) {
            (JoinBuildSide::Left, _, _) => BuildSide::Left,
            (JoinBuildSide::Right, _, _) => BuildSide::Right,
            (JoinBuildSide::Auto, Some(left), Some(right)) if right < left => BuildSide::Right,
            (JoinBuildSide::Auto, _, _) => BuildSide::Left,
        }
    }

    /// Conditions oriented so that `left_field` reads the build relation.
    pub fn build_conditions(&self) -> Vec<Vec<JoinCondition>> {
        match self.build_side {
            BuildSide::Left => self.condition_groups.clone(),
            BuildSide::Right => self
                .condition_groups
                .iter()
                .map(|group| group.iter().map(JoinCondition::flip).collect())
                .collect(),
        }
    }

    pub fn build_schema(&self) -> Option<&RowSchemaRef> {
        match self.build_side {
            BuildSide::Left => self.left_schema.as_ref(),
            BuildSide::Right => self.right_schema.as_ref(),
        }
    }

    pub fn probe_schema(&self) -> Option<&RowSchemaRef> {
        match self.build_side {
            BuildSide::Left => self.right_schema.as_ref(),
            BuildSide::Right => self.left_schema.as_ref(),
        }
    }

    /// Creates the hash table fitting the ON clause.
    ///
    /// Fails with `MissingField` when a key field is absent from a known schema.
    pub fn create_hash_table(&self) -> Result<Box<dyn HashTable>> {
        let mut indexes = self
            .build_conditions()
            .iter()
            .map(|group| KeyIndex::try_create(group, self.build_schema(), self.probe_schema()))
            .collect::<Result<Vec<_>>>()?;

        Ok(match indexes.len() {
            0 => Box::new(ListHashTable::create()),
            1 => Box::new(DefaultHashTable::create_with_index(indexes.remove(0))),
            _ => Box::new(HashTableGroup::create_with_indexes(indexes)),
        })
    }

    pub fn conditions_display(&self) -> String {
        self.condition_groups
            .iter()
            .map(|group| group.iter().join(" AND "))
            .join(" OR ")
    }
}
