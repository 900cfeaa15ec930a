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

#![allow(clippy::uninlined_format_args)]

//! Client-side equi-join for relations served by a search index.
//!
//! The build relation is loaded into a [`HashTable`], the distinct build-side
//! key values are pushed to the probe-side request as IN filters, and the
//! probe relation is then streamed against the table.
//!
//! The whole build side stays in memory for the lifetime of the operator.
//! There is no size cap and no spilling: joins over an unbounded build
//! relation can exhaust host memory.

mod desc;
mod hash_join_state;
mod hash_join_table;
mod join_key;
mod joined_row;
mod operator;
mod row_source;
mod runtime_filter;

pub use desc::BuildSide;
pub use desc::HashJoinDesc;
pub use desc::JoinCondition;
pub use desc::JoinType;
pub use hash_join_state::JoinState;
pub use hash_join_table::DefaultHashTable;
pub use hash_join_table::HashTable;
pub use hash_join_table::HashTableGroup;
pub use hash_join_table::ListHashTable;
pub use hash_join_table::RowPtr;
pub use join_key::JoinKey;
pub use join_key::JoinKeyExtractor;
pub use joined_row::JoinedRow;
pub use operator::HashJoinOperator;
pub use operator::JoinStream;
pub use row_source::IterRowSource;
pub use row_source::RowSource;
pub use row_source::VecRowSource;
pub use runtime_filter::build_pushdown_packet;
pub use runtime_filter::eval_pushdown_filters;
pub use runtime_filter::push_down_filters;
pub use runtime_filter::ProbeRequestBuilder;
pub use runtime_filter::PushdownKeyCollector;
pub use runtime_filter::PushdownPacket;
pub use runtime_filter::PushdownValues;
