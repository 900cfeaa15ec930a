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

use ahash::AHashMap;
use itertools::Itertools;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

use crate::Scalar;

pub type RowSchemaRef = Arc<RowSchema>;

/// Ordered, duplicate-free field names shared by all rows of one relation.
#[derive(Debug, Clone)]
pub struct RowSchema {
    fields: Vec<String>,
    index: AHashMap<String, usize>,
}

impl RowSchema {
    pub fn try_create(fields: Vec<String>) -> Result<RowSchemaRef> {
        let mut index = AHashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if index.insert(field.clone(), idx).is_some() {
                return Err(ErrorCode::BadArguments(format!(
                    "Duplicate field {:?} in row schema",
                    field
                )));
            }
        }

        Ok(Arc::new(RowSchema { fields, index }))
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

impl PartialEq for RowSchema {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for RowSchema {}

pub type RowRef = Arc<Row>;

/// An immutable tuple of named values.
#[derive(Debug, Clone)]
pub struct Row {
    schema: RowSchemaRef,
    values: Vec<Scalar>,
}

impl Row {
    pub fn try_create(schema: RowSchemaRef, values: Vec<Scalar>) -> Result<Row> {
        if schema.num_fields() != values.len() {
            return Err(ErrorCode::BadArguments(format!(
                "Row has {} values but schema has {} fields",
                values.len(),
                schema.num_fields()
            )));
        }

        Ok(Row { schema, values })
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Row>
    where
        K: Into<String>,
        V: Into<Scalar>,
    {
        let (fields, values): (Vec<String>, Vec<Scalar>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Row::try_create(RowSchema::try_create(fields)?, values)
    }

    /// Builds a row from a search hit document.
    ///
    /// Nested objects flatten into dotted field names, so `{"a": {"b": 1}}`
    /// yields the field `a.b`. Arrays are not supported.
    pub fn from_json(document: &serde_json::Value) -> Result<Row> {
        let serde_json::Value::Object(object) = document else {
            return Err(ErrorCode::BadDataValueType(format!(
                "Expected a json object as row, got {}",
                document
            )));
        };

        let mut pairs = Vec::with_capacity(object.len());
        flatten_json_object("", object, &mut pairs)?;
        Row::from_pairs(pairs)
    }

    pub fn schema(&self) -> &RowSchemaRef {
        &self.schema
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn num_fields(&self) -> usize {
        self.values.len()
    }

    pub fn value_at(&self, index: usize) -> Option<&Scalar> {
        self.values.get(index)
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.schema
            .index_of(field)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.schema
            .fields()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), serde_json::to_value(v).unwrap_or_default()))
                .collect(),
        )
    }
}

fn flatten_json_object(
    prefix: &str,
    object: &serde_json::Map<String, serde_json::Value>,
    pairs: &mut Vec<(String, Scalar)>,
) -> Result<()> {
    for (key, value) in object {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_json::Value::Object(inner) => flatten_json_object(&name, inner, pairs)?,
            other => {
                let scalar = Scalar::try_from_json(other)
                    .map_err(|e| e.add_message(format!("Field {:?}", name)))?;
                pairs.push((name, scalar));
            }
        }
    }
    Ok(())
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.schema.fields() == other.schema.fields() && self.values == other.values
    }
}

impl Eq for Row {}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.iter().map(|(k, v)| format!("{}: {}", k, v)).join(", ")
        )
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.num_fields()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
