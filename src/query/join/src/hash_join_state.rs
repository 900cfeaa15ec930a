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

/// Lifecycle of a [`crate::HashJoinOperator`].
///
/// ```text
/// Unbuilt -> Building -> Built -> Probing -> Done
///     \__________\__________\________\______> Failed
/// ```
///
/// `Unbuilt -> Built` is also allowed when the build relation is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum JoinState {
    Unbuilt,
    Building,
    Built,
    Probing,
    Done,
    Failed,
}

impl JoinState {
    pub fn can_add(&self) -> bool {
        matches!(self, JoinState::Unbuilt | JoinState::Building)
    }

    pub fn can_probe(&self) -> bool {
        matches!(self, JoinState::Built | JoinState::Probing)
    }
}

impl Display for JoinState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JoinState::Unbuilt => "Unbuilt",
            JoinState::Building => "Building",
            JoinState::Built => "Built",
            JoinState::Probing => "Probing",
            JoinState::Done => "Done",
            JoinState::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}
