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

use ahash::AHashMap;
use searchql_common_exception::Result;
use searchql_query_expression::Row;
use searchql_query_expression::RowSchemaRef;

use crate::desc::JoinCondition;
use crate::hash_join_table::RowPtr;
use crate::join_key::JoinKey;
use crate::join_key::JoinKeyExtractor;
use crate::runtime_filter::PushdownKeyCollector;
use crate::runtime_filter::PushdownValues;

struct Bucket {
    key: JoinKey,
    ptrs: Vec<RowPtr>,
}

/// Maps the composite key of one AND-ed condition group to build row pointers.
///
/// Buckets are kept in the order their key was first inserted.
pub struct KeyIndex {
    build_keys: JoinKeyExtractor,
    probe_keys: JoinKeyExtractor,
    key_to_bucket: AHashMap<JoinKey, usize>,
    buckets: Vec<Bucket>,
}

impl KeyIndex {
    pub fn create(conditions: &[JoinCondition]) -> KeyIndex {
        let (build_fields, probe_fields) = split_conditions(conditions);
        KeyIndex::create_with_extractors(
            JoinKeyExtractor::create(build_fields),
            JoinKeyExtractor::create(probe_fields),
        )
    }

    pub fn try_create(
        conditions: &[JoinCondition],
        build_schema: Option<&RowSchemaRef>,
        probe_schema: Option<&RowSchemaRef>,
    ) -> Result<KeyIndex> {
        let (build_fields, probe_fields) = split_conditions(conditions);
        let build_keys = match build_schema {
            Some(schema) => JoinKeyExtractor::try_create(schema, build_fields)?,
            None => JoinKeyExtractor::create(build_fields),
        };
        let probe_keys = match probe_schema {
            Some(schema) => JoinKeyExtractor::try_create(schema, probe_fields)?,
            None => JoinKeyExtractor::create(probe_fields),
        };
        Ok(KeyIndex::create_with_extractors(build_keys, probe_keys))
    }

    fn create_with_extractors(
        build_keys: JoinKeyExtractor,
        probe_keys: JoinKeyExtractor,
    ) -> KeyIndex {
        KeyIndex {
            build_keys,
            probe_keys,
            key_to_bucket: AHashMap::new(),
            buckets: vec![],
        }
    }

    pub fn build_key(&self, row: &Row) -> Result<JoinKey> {
        self.build_keys.extract(row)
    }

    pub fn insert(&mut self, key: JoinKey, ptr: RowPtr) {
        if key.has_null() {
            return;
        }

        match self.key_to_bucket.get(&key) {
            Some(idx) => self.buckets[*idx].ptrs.push(ptr),
            None => {
                self.key_to_bucket.insert(key.clone(), self.buckets.len());
                self.buckets.push(Bucket {
                    key,
                    ptrs: vec![ptr],
                });
            }
        }
    }

    pub fn probe(&self, row: &Row) -> Result<&[RowPtr]> {
        let key = self.probe_keys.extract(row)?;
        if key.has_null() {
            return Ok(&[]);
        }

        Ok(match self.key_to_bucket.get(&key) {
            Some(idx) => &self.buckets[*idx].ptrs,
            None => &[],
        })
    }

    pub fn num_keys(&self) -> usize {
        self.buckets.len()
    }

    pub fn pushdown_values(&self) -> Vec<PushdownValues> {
        let mut collector = PushdownKeyCollector::create(self.probe_keys.fields());
        for bucket in &self.buckets {
            collector.collect(&bucket.key);
        }
        collector.finish()
    }

    pub fn clear(&mut self) {
        self.key_to_bucket = AHashMap::new();
        self.buckets = vec![];
    }
}

fn split_conditions(conditions: &[JoinCondition]) -> (Vec<String>, Vec<String>) {
    conditions
        .iter()
        .map(|c| (c.left_field.clone(), c.right_field.clone()))
        .unzip()
}
