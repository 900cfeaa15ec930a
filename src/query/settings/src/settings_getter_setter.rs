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
use std::str::FromStr;

use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;

use crate::settings::Settings;

/// Which relation of a join is loaded into the hash table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinBuildSide {
    /// The smaller relation when both row estimates are known, the left one otherwise.
    Auto,
    Left,
    Right,
}

impl FromStr for JoinBuildSide {
    type Err = ErrorCode;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(JoinBuildSide::Auto),
            "left" => Ok(JoinBuildSide::Left),
            "right" => Ok(JoinBuildSide::Right),
            _ => Err(ErrorCode::WrongValueForVariable(format!(
                "Unknown join build side: {:?}",
                s
            ))),
        }
    }
}

impl Display for JoinBuildSide {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinBuildSide::Auto => write!(f, "auto"),
            JoinBuildSide::Left => write!(f, "left"),
            JoinBuildSide::Right => write!(f, "right"),
        }
    }
}

impl Settings {
    pub fn get_enable_join_pushdown(&self) -> Result<bool> {
        Ok(self.try_get_u64("enable_join_pushdown")? != 0)
    }

    pub fn set_enable_join_pushdown(&self, val: bool) -> Result<()> {
        self.try_set_u64("enable_join_pushdown", u64::from(val))
    }

    pub fn get_join_pushdown_values_threshold(&self) -> Result<u64> {
        self.try_get_u64("join_pushdown_values_threshold")
    }

    pub fn set_join_pushdown_values_threshold(&self, val: u64) -> Result<()> {
        self.try_set_u64("join_pushdown_values_threshold", val)
    }

    pub fn get_join_build_side(&self) -> Result<JoinBuildSide> {
        self.try_get_string("join_build_side")?.parse()
    }

    pub fn set_join_build_side(&self, val: JoinBuildSide) -> Result<()> {
        self.set_setting("join_build_side".to_string(), val.to_string())
    }
}
