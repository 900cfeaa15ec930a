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
use std::sync::Arc;

use dashmap::DashMap;
use itertools::Itertools;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;

use crate::settings_default::DefaultSettingValue;
use crate::settings_default::DefaultSettings;
use crate::settings_default::SettingValue;

#[derive(Clone, Debug)]
pub struct ChangeValue {
    pub value: SettingValue,
}

/// Per-query settings: the defaults plus the values changed for this query.
#[derive(Debug)]
pub struct Settings {
    pub(crate) changes: DashMap<String, ChangeValue>,
}

impl Settings {
    pub fn create() -> Arc<Settings> {
        Arc::new(Settings {
            changes: DashMap::new(),
        })
    }

    pub fn has_setting(&self, key: &str) -> Result<bool> {
        DefaultSettings::has_setting(key)
    }

    pub fn check_and_get_default_value(&self, key: &str) -> Result<SettingValue> {
        match DefaultSettings::instance()?.settings.get(key) {
            Some(v) => Ok(v.value.clone()),
            None => Err(ErrorCode::UnknownVariable(format!(
                "Unknown variable: {:?}",
                key
            ))),
        }
    }

    pub fn set_setting(&self, k: String, v: String) -> Result<()> {
        let (key, value) = DefaultSettings::convert_value(k, v)?;
        log::debug!("set setting {} = {}", key, value);
        self.changes.insert(key, ChangeValue { value });
        Ok(())
    }

    pub fn unset_setting(&self, k: &str) {
        self.changes.remove(k);
    }

    pub fn set_batch_settings(&self, settings: &HashMap<String, String>) -> Result<()> {
        for (k, v) in settings.iter() {
            if self.has_setting(k.as_str())? {
                self.set_setting(k.to_string(), v.to_string())?;
            }
        }

        Ok(())
    }

    pub(crate) fn try_get_u64(&self, key: &str) -> Result<u64> {
        match self.changes.get(key) {
            Some(v) => v.value.as_u64(),
            None => DefaultSettings::try_get_u64(key),
        }
    }

    pub(crate) fn try_get_string(&self, key: &str) -> Result<String> {
        match self.changes.get(key) {
            Some(v) => Ok(v.value.as_string()),
            None => DefaultSettings::try_get_string(key),
        }
    }

    pub(crate) fn try_set_u64(&self, key: &str, val: u64) -> Result<()> {
        self.set_setting(key.to_string(), val.to_string())
    }
}

pub struct SettingsItem {
    pub name: String,
    pub desc: &'static str,
    pub user_value: SettingValue,
    pub default_value: SettingValue,
    pub changed: bool,
}

pub struct SettingsIter<'a> {
    settings: &'a Settings,
    inner: std::vec::IntoIter<(String, DefaultSettingValue)>,
}

impl<'a> SettingsIter<'a> {
    pub fn create(settings: &'a Settings) -> Result<SettingsIter<'a>> {
        let iter = DefaultSettings::instance()?
            .settings
            .clone()
            .into_iter()
            .sorted_by(|(l, _), (r, _)| Ord::cmp(l, r));

        Ok(SettingsIter::<'a> {
            settings,
            inner: iter,
        })
    }
}

impl<'a> Iterator for SettingsIter<'a> {
    type Item = SettingsItem;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, default_value) = self.inner.next()?;
        Some(match self.settings.changes.get(&key) {
            None => SettingsItem {
                name: key,
                desc: default_value.desc,
                user_value: default_value.value.clone(),
                default_value: default_value.value,
                changed: false,
            },
            Some(change_value) => SettingsItem {
                name: key,
                desc: default_value.desc,
                user_value: change_value.value.clone(),
                default_value: default_value.value,
                changed: true,
            },
        })
    }
}
