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

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;
use searchql_query_expression::Row;
use searchql_query_settings::Settings;

use crate::desc::HashJoinDesc;
use crate::desc::JoinType;
use crate::hash_join_state::JoinState;
use crate::hash_join_table::HashTable;
use crate::joined_row::JoinedRow;
use crate::row_source::RowSource;
use crate::runtime_filter::build_pushdown_packet;
use crate::runtime_filter::push_down_filters;
use crate::runtime_filter::ProbeRequestBuilder;
use crate::runtime_filter::PushdownPacket;

/// Build-then-probe hash join over two row streams.
///
/// The operator owns its hash table for the whole query. Any failure clears
/// the table and leaves the operator `Failed`; driving it out of order is
/// rejected with `IllegalJoinState` and changes nothing.
pub struct HashJoinOperator {
    desc: Arc<HashJoinDesc>,
    settings: Arc<Settings>,
    state: JoinState,
    hash_table: Box<dyn HashTable>,
    pushdown: Option<PushdownPacket>,
    // Build rows already emitted by a probe, LEFT OUTER only.
    matched: Vec<bool>,
}

impl HashJoinOperator {
    pub fn try_create(desc: Arc<HashJoinDesc>, settings: Arc<Settings>) -> Result<Self> {
        let hash_table = desc.create_hash_table()?;
        log::debug!(
            "HASH-JOIN: Create {} join on [{}] with {}, build side {:?}",
            desc.join_type,
            desc.conditions_display(),
            hash_table.name(),
            desc.build_side
        );

        Ok(HashJoinOperator {
            desc,
            settings,
            state: JoinState::Unbuilt,
            hash_table,
            pushdown: None,
            matched: vec![],
        })
    }

    pub fn state(&self) -> JoinState {
        self.state
    }

    pub fn desc(&self) -> &HashJoinDesc {
        &self.desc
    }

    pub fn hash_table(&self) -> &dyn HashTable {
        self.hash_table.as_ref()
    }

    /// Filters computed at `build_end`, if pushdown was enabled.
    pub fn pushdown_packet(&self) -> Option<&PushdownPacket> {
        self.pushdown.as_ref()
    }

    fn check_state(&self, allowed: bool, operation: &str) -> Result<()> {
        if allowed {
            return Ok(());
        }

        Err(ErrorCode::IllegalJoinState(format!(
            "Cannot {} a hash join in state {}",
            operation, self.state
        )))
    }

    fn fail(&mut self, cause: ErrorCode) -> ErrorCode {
        log::warn!(
            "HASH-JOIN: Join failed in state {} with {} build rows: {}",
            self.state,
            self.hash_table.size(),
            cause
        );
        self.state = JoinState::Failed;
        self.release();
        cause
    }

    fn release(&mut self) {
        self.hash_table.clear();
        self.matched = vec![];
        self.pushdown = None;
    }

    pub fn add(&mut self, row: Row) -> Result<()> {
        self.check_state(self.state.can_add(), "add a build row to")?;
        self.state = JoinState::Building;

        match self.hash_table.add(row) {
            Ok(_) => Ok(()),
            Err(cause) => Err(self.fail(cause)),
        }
    }

    /// Drains the build relation into the hash table.
    pub fn build(&mut self, source: &mut dyn RowSource) -> Result<()> {
        self.check_state(self.state.can_add(), "build")?;
        loop {
            match source.next_row() {
                Ok(Some(row)) => self.add(row)?,
                Ok(None) => return Ok(()),
                Err(cause) => return Err(self.fail(cause)),
            }
        }
    }

    /// Ends the build phase and pushes the build-side key values to the
    /// probe request before any probe row is pulled.
    pub fn build_end(&mut self, request_builder: Option<&mut dyn ProbeRequestBuilder>) -> Result<()> {
        self.check_state(self.state.can_add(), "end the build phase of")?;
        match self.try_build_end(request_builder) {
            Ok(_) => Ok(()),
            Err(cause) => Err(self.fail(cause)),
        }
    }

    fn try_build_end(&mut self, request_builder: Option<&mut dyn ProbeRequestBuilder>) -> Result<()> {
        let start = Instant::now();
        if self.settings.get_enable_join_pushdown()? {
            let threshold = self.settings.get_join_pushdown_values_threshold()?;
            let packet = build_pushdown_packet(self.hash_table.as_ref(), threshold);
            if let Some(builder) = request_builder {
                push_down_filters(&packet, builder)?;
            }
            self.pushdown = Some(packet);
        }

        if self.desc.join_type == JoinType::LeftOuter {
            self.matched = vec![false; self.hash_table.size()];
        }

        self.state = JoinState::Built;
        log::info!(
            "HASH-JOIN: Build phase done, {} rows in {}, pushdown {}, elapsed {:?}",
            self.hash_table.size(),
            self.hash_table.name(),
            self.pushdown.is_some(),
            start.elapsed()
        );
        Ok(())
    }

    /// Joins one probe row against the table.
    pub fn probe(&mut self, row: Row) -> Result<Vec<JoinedRow>> {
        self.check_state(self.state.can_probe(), "probe")?;
        self.state = JoinState::Probing;

        let ptrs = match self.hash_table.probe_ptrs(&row) {
            Ok(ptrs) => ptrs,
            Err(cause) => return Err(self.fail(cause)),
        };

        let probe = Arc::new(row);
        let build_rows = self.hash_table.rows();
        let mut joined = Vec::with_capacity(ptrs.len());
        for ptr in ptrs {
            if let Some(build) = build_rows.get(ptr) {
                if let Some(matched) = self.matched.get_mut(ptr) {
                    *matched = true;
                }
                joined.push(JoinedRow::create(
                    build.clone(),
                    Some(probe.clone()),
                    self.desc.build_side,
                ));
            }
        }
        Ok(joined)
    }

    /// Ends the probe phase. LEFT OUTER joins return the build rows no probe
    /// row matched, in insertion order.
    pub fn finish(&mut self) -> Result<Vec<JoinedRow>> {
        self.check_state(self.state.can_probe(), "finish")?;

        let unmatched = self
            .hash_table
            .rows()
            .iter()
            .zip(self.matched.iter())
            .filter(|(_, matched)| !**matched)
            .map(|(build, _)| JoinedRow::create(build.clone(), None, self.desc.build_side))
            .collect::<Vec<_>>();

        log::debug!(
            "HASH-JOIN: Probe phase done, {} unmatched build rows emitted",
            unmatched.len()
        );
        self.state = JoinState::Done;
        Ok(unmatched)
    }

    /// An inner join against an empty table can't produce anything, so the
    /// probe relation need not be read at all.
    fn can_skip_probe(&self) -> bool {
        self.desc.join_type == JoinType::Inner
            && self.state == JoinState::Built
            && self.hash_table.is_empty()
    }

    /// Lazily joins the probe relation, one probe row at a time.
    pub fn probe_stream<'a>(&'a mut self, source: &'a mut dyn RowSource) -> JoinStream<'a> {
        JoinStream {
            operator: self,
            source,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Runs both phases and collects every joined row.
    pub fn execute(
        &mut self,
        build_source: &mut dyn RowSource,
        probe_source: &mut dyn RowSource,
        request_builder: Option<&mut dyn ProbeRequestBuilder>,
    ) -> Result<Vec<JoinedRow>> {
        self.build(build_source)?;
        self.build_end(request_builder)?;
        self.probe_stream(probe_source).collect()
    }

    /// Releases the table. A failed operator stays `Failed`.
    pub fn close(&mut self) {
        self.release();
        if self.state != JoinState::Failed {
            self.state = JoinState::Done;
        }
    }

    pub fn explain(&self) -> serde_json::Value {
        serde_json::json!({
            "join_type": self.desc.join_type.to_string(),
            "build_side": self.desc.build_side,
            "conditions": self.desc.conditions_display(),
            "state": self.state,
            "hash_table": self.hash_table.name(),
            "build_rows": self.hash_table.size(),
            "pushdown": self.pushdown,
        })
    }
}

/// Iterator returned by [`HashJoinOperator::probe_stream`].
///
/// Stops after the first error. LEFT OUTER unmatched rows come last.
pub struct JoinStream<'a> {
    operator: &'a mut HashJoinOperator,
    source: &'a mut dyn RowSource,
    pending: VecDeque<JoinedRow>,
    exhausted: bool,
}

impl JoinStream<'_> {
    fn end(&mut self) -> Result<()> {
        self.exhausted = true;
        let unmatched = self.operator.finish()?;
        self.pending.extend(unmatched);
        Ok(())
    }
}

impl Iterator for JoinStream<'_> {
    type Item = Result<JoinedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(joined) = self.pending.pop_front() {
                return Some(Ok(joined));
            }

            if self.exhausted {
                return None;
            }

            let operator = &*self.operator;
            if let Err(cause) = operator.check_state(operator.state.can_probe(), "probe") {
                self.exhausted = true;
                return Some(Err(cause));
            }

            if self.operator.can_skip_probe() {
                log::debug!("HASH-JOIN: Empty build side, skip the probe relation");
                if let Err(cause) = self.end() {
                    return Some(Err(cause));
                }
                continue;
            }

            match self.source.next_row() {
                Ok(Some(row)) => match self.operator.probe(row) {
                    Ok(joined) => self.pending.extend(joined),
                    Err(cause) => {
                        self.exhausted = true;
                        return Some(Err(cause));
                    }
                },
                Ok(None) => {
                    if let Err(cause) = self.end() {
                        return Some(Err(cause));
                    }
                }
                Err(cause) => {
                    self.exhausted = true;
                    return Some(Err(self.operator.fail(cause)));
                }
            }
        }
    }
}
