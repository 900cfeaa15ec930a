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

use std::time::Instant;

use searchql_common_exception::Result;

use super::builder::PushdownPacket;
use super::builder::PushdownValues;

/// The component issuing the probe-side query to the search backend.
///
/// Each entry of a group is expected to become a `field IN (values)`
/// predicate. The predicates of a group are AND-ed, the groups are OR-ed and
/// the result is AND-ed into that query. An empty value set means the group
/// matches nothing.
pub trait ProbeRequestBuilder {
    fn attach_pushdown_filters(&mut self, groups: &[Vec<PushdownValues>]) -> Result<()>;
}

pub fn push_down_filters(
    packet: &PushdownPacket,
    builder: &mut dyn ProbeRequestBuilder,
) -> Result<()> {
    if packet.groups.is_empty() {
        log::debug!("JOIN-PUSHDOWN: No filter to attach to probe request");
        return Ok(());
    }

    let start = Instant::now();
    builder.attach_pushdown_filters(&packet.groups)?;

    log::info!(
        "JOIN-PUSHDOWN: Attached {} filter groups to probe request in {:?}",
        packet.groups.len(),
        start.elapsed()
    );
    log::debug!("JOIN-PUSHDOWN: filters: {:?}", packet.groups);
    Ok(())
}
