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

use std::collections::HashMap;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::RangeInclusive;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;

static DEFAULT_SETTINGS: OnceCell<Arc<DefaultSettings>> = OnceCell::new();

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SettingValue {
    UInt64(u64),
    String(String),
}

impl SettingValue {
    pub fn as_u64(&self) -> Result<u64> {
        match self {
            SettingValue::UInt64(val) => Ok(*val),
            SettingValue::String(val) => Err(ErrorCode::BadArguments(format!(
                "Setting value {:?} is not an integer",
                val
            ))),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            SettingValue::UInt64(val) => val.to_string(),
            SettingValue::String(val) => val.clone(),
        }
    }
}

impl Display for SettingValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

#[derive(Clone, Debug)]
pub enum SettingRange {
    Numeric(RangeInclusive<u64>),
    String(Vec<&'static str>),
}

impl Display for SettingRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingRange::Numeric(range) => write!(f, "[{}, {}]", range.start(), range.end()),
            SettingRange::String(values) => write!(f, "{:?}", values),
        }
    }
}

impl SettingRange {
    /// Checks if an integer value is within the numeric range.
    pub fn is_within_numeric_range(&self, value: u64) -> Result<()> {
        match self {
            SettingRange::Numeric(range) => {
                if range.contains(&value) {
                    Ok(())
                } else {
                    Err(ErrorCode::WrongValueForVariable(format!(
                        "Value {} is not within the range {}",
                        value, self
                    )))
                }
            }
            _ => Err(ErrorCode::BadArguments(
                "Expected numeric range".to_string(),
            )),
        }
    }

    /// Checks if a string value is within the string range, returns the canonical spelling.
    pub fn is_within_string_range(&self, value: &str) -> Result<String> {
        match self {
            SettingRange::String(values) => {
                match values.iter().find(|&s| s.eq_ignore_ascii_case(value)) {
                    Some(s) => Ok(s.to_string()),
                    None => Err(ErrorCode::WrongValueForVariable(format!(
                        "Value {} is not within the allowed values {}",
                        value, self
                    ))),
                }
            }
            _ => Err(ErrorCode::BadArguments("Expected string range".to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DefaultSettingValue {
    pub(crate) value: SettingValue,
    pub(crate) desc: &'static str,
    pub(crate) range: Option<SettingRange>,
}

#[derive(Clone)]
pub struct DefaultSettings {
    pub(crate) settings: HashMap<String, DefaultSettingValue>,
}

impl DefaultSettings {
    pub fn instance() -> Result<Arc<DefaultSettings>> {
        Ok(Arc::clone(DEFAULT_SETTINGS.get_or_try_init(|| -> Result<Arc<DefaultSettings>> {
            let default_settings = HashMap::from([
                ("enable_join_pushdown", DefaultSettingValue {
                    value: SettingValue::UInt64(1),
                    desc: "Pushes the distinct build-side join keys to the probe-side request as IN filters.",
                    range: Some(SettingRange::Numeric(0..=1)),
                }),
                ("join_pushdown_values_threshold", DefaultSettingValue {
                    value: SettingValue::UInt64(1024),
                    desc: "Sets the maximum number of distinct values of one join key field that are pushed down to the probe side.",
                    range: Some(SettingRange::Numeric(0..=u64::MAX)),
                }),
                ("join_build_side", DefaultSettingValue {
                    value: SettingValue::String("auto".to_owned()),
                    desc: "Chooses the relation loaded into the hash table. auto picks the smaller relation when row estimates are known.",
                    range: Some(SettingRange::String(vec!["auto", "left", "right"])),
                }),
            ]);

            Ok(Arc::new(DefaultSettings {
                settings: default_settings.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            }))
        })?))
    }

    pub fn has_setting(key: &str) -> Result<bool> {
        Ok(Self::instance()?.settings.contains_key(key))
    }

    pub fn try_get_u64(key: &str) -> Result<u64> {
        match DefaultSettings::instance()?.settings.get(key) {
            Some(v) => v.value.as_u64(),
            None => Err(ErrorCode::UnknownVariable(format!(
                "Unknown variable: {:?}",
                key
            ))),
        }
    }

    pub fn try_get_string(key: &str) -> Result<String> {
        match DefaultSettings::instance()?.settings.get(key) {
            Some(v) => Ok(v.value.as_string()),
            None => Err(ErrorCode::UnknownVariable(format!(
                "Unknown variable: {:?}",
                key
            ))),
        }
    }

    /// Validates `v` against the default value type and range of setting `k`.
    pub fn convert_value(k: String, v: String) -> Result<(String, SettingValue)> {
        let default_settings = DefaultSettings::instance()?;

        let setting_value = default_settings
            .settings
            .get(&k)
            .ok_or_else(|| ErrorCode::UnknownVariable(format!("Unknown variable: {:?}", k)))?;

        match &setting_value.range {
            None => match setting_value.value {
                SettingValue::UInt64(_) => {
                    let u64_val = Self::parse_to_u64(&v)?;
                    Ok((k, SettingValue::UInt64(u64_val)))
                }
                SettingValue::String(_) => Ok((k, SettingValue::String(v))),
            },
            Some(range) => match range {
                SettingRange::Numeric(_) => {
                    let u64_val = Self::parse_to_u64(&v)?;
                    range.is_within_numeric_range(u64_val)?;
                    Ok((k, SettingValue::UInt64(u64_val)))
                }
                SettingRange::String(_) => {
                    let value = range.is_within_string_range(&v)?;
                    Ok((k, SettingValue::String(value)))
                }
            },
        }
    }

    fn parse_to_u64(v: &str) -> Result<u64> {
        v.trim().parse::<u64>().map_err(|_| {
            ErrorCode::WrongValueForVariable(format!("{} is not a valid integer value", v))
        })
    }
}
