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
use std::sync::Arc;

use itertools::Itertools;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;
use searchql_query_expression::Row;
use searchql_query_expression::RowSchemaRef;
use searchql_query_expression::Scalar;

/// Composite join key, one value per equality of the ON clause.
///
/// Hashing and equality are positional, so `(a, b)` and `(b, a)` differ.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JoinKey(Vec<Scalar>);

impl JoinKey {
    pub fn new(values: Vec<Scalar>) -> Self {
        JoinKey(values)
    }

    pub fn values(&self) -> &[Scalar] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A key with a NULL component never matches any key.
    pub fn has_null(&self) -> bool {
        self.0.iter().any(Scalar::is_null)
    }
}

impl Display for JoinKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

/// Reads the key fields of one join side from rows.
#[derive(Clone, Debug)]
pub struct JoinKeyExtractor {
    fields: Vec<String>,
    // Field offsets in the schema the extractor was resolved against.
    resolved: Option<(RowSchemaRef, Vec<usize>)>,
}

impl JoinKeyExtractor {
    /// An extractor looking fields up by name for every row.
    pub fn create(fields: Vec<String>) -> Self {
        JoinKeyExtractor {
            fields,
            resolved: None,
        }
    }

    /// Resolves `fields` against `schema` up front, failing on unknown fields.
    pub fn try_create(schema: &RowSchemaRef, fields: Vec<String>) -> Result<Self> {
        let offsets = fields
            .iter()
            .map(|field| {
                schema.index_of(field).ok_or_else(|| {
                    ErrorCode::MissingField(format!(
                        "Join key field {:?} is not found in schema [{}]",
                        field,
                        schema.fields().join(", ")
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(JoinKeyExtractor {
            fields,
            resolved: Some((schema.clone(), offsets)),
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn extract(&self, row: &Row) -> Result<JoinKey> {
        if let Some((schema, offsets)) = &self.resolved {
            if Arc::ptr_eq(schema, row.schema()) {
                let values = offsets
                    .iter()
                    .map(|offset| row.values()[*offset].clone())
                    .collect();
                return Ok(JoinKey(values));
            }
        }

        let values = self
            .fields
            .iter()
            .map(|field| {
                row.get(field).cloned().ok_or_else(|| {
                    ErrorCode::MissingField(format!(
                        "Join key field {:?} is not found in row {}",
                        field, row
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(JoinKey(values))
    }
}
