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
use std::hash::Hash;
use std::hash::Hasher;

use enum_as_inner::EnumAsInner;
use ordered_float::OrderedFloat;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;
use serde::Serialize;
use serde::Serializer;

pub type F64 = OrderedFloat<f64>;

/// A single field value of a row.
///
/// Integer and float numbers compare by numeric value: `Int64(1) == Float64(1.0)`,
/// and equal scalars always hash identically. `Null == Null` holds at this level;
/// SQL NULL semantics are applied by join keys, not by the value type.
#[derive(Debug, Clone, Default, EnumAsInner)]
pub enum Scalar {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(F64),
    String(String),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "Null",
            Scalar::Boolean(_) => "Boolean",
            Scalar::Int64(_) => "Int64",
            Scalar::Float64(_) => "Float64",
            Scalar::String(_) => "String",
        }
    }

    /// Converts a JSON leaf value. Arrays and objects are not scalars.
    pub fn try_from_json(value: &serde_json::Value) -> Result<Scalar> {
        match value {
            serde_json::Value::Null => Ok(Scalar::Null),
            serde_json::Value::Bool(v) => Ok(Scalar::Boolean(*v)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => Ok(Scalar::Int64(v)),
                None => n.as_f64().map(|v| Scalar::Float64(v.into())).ok_or_else(|| {
                    ErrorCode::BadDataValueType(format!("Unsupported json number {}", n))
                }),
            },
            serde_json::Value::String(v) => Ok(Scalar::String(v.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(ErrorCode::BadDataValueType(format!(
                    "Unsupported json value {} for a scalar",
                    value
                )))
            }
        }
    }
}

/// The integer a float is exactly equal to, if any.
fn float_as_exact_i64(v: f64) -> Option<i64> {
    // 2^63 is exactly representable, i64::MAX is not.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if v.fract() == 0.0 && (-BOUND..BOUND).contains(&v) {
        Some(v as i64)
    } else {
        None
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Boolean(l), Scalar::Boolean(r)) => l == r,
            (Scalar::Int64(l), Scalar::Int64(r)) => l == r,
            (Scalar::Float64(l), Scalar::Float64(r)) => l == r,
            (Scalar::Int64(i), Scalar::Float64(f)) | (Scalar::Float64(f), Scalar::Int64(i)) => {
                float_as_exact_i64(f.0) == Some(*i)
            }
            (Scalar::String(l), Scalar::String(r)) => l == r,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Scalar::Null => 0u8.hash(state),
            Scalar::Boolean(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            Scalar::Int64(v) => {
                2u8.hash(state);
                v.hash(state);
            }
            Scalar::Float64(v) => match float_as_exact_i64(v.0) {
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None => {
                    3u8.hash(state);
                    v.hash(state);
                }
            },
            Scalar::String(v) => {
                4u8.hash(state);
                v.hash(state);
            }
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Boolean(v) => write!(f, "{}", v),
            Scalar::Int64(v) => write!(f, "{}", v),
            Scalar::Float64(v) => write!(f, "{:?}", v.0),
            Scalar::String(v) => write!(f, "'{}'", v),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Boolean(v) => serializer.serialize_bool(*v),
            Scalar::Int64(v) => serializer.serialize_i64(*v),
            Scalar::Float64(v) => serializer.serialize_f64(v.0),
            Scalar::String(v) => serializer.serialize_str(v),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int64(v as i64)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int64(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float64(OrderedFloat(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Scalar::Null)
    }
}
