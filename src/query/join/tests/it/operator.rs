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

use std::cell::Cell;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;
use searchql_query_expression::Row;
use searchql_query_expression::RowSchema;
use searchql_query_expression::Scalar;
use searchql_query_join::eval_pushdown_filters;
use searchql_query_join::BuildSide;
use searchql_query_join::HashJoinDesc;
use searchql_query_join::HashJoinOperator;
use searchql_query_join::HashTable;
use searchql_query_join::IterRowSource;
use searchql_query_join::JoinCondition;
use searchql_query_join::JoinState;
use searchql_query_join::JoinType;
use searchql_query_join::JoinedRow;
use searchql_query_join::PushdownValues;
use searchql_query_join::VecRowSource;
use searchql_query_settings::JoinBuildSide;
use searchql_query_settings::Settings;
use serde_json::json;

use crate::common::init_test_logging;
use crate::common::row;
use crate::common::rows;
use crate::common::try_create_operator;
use crate::common::RecordingRequestBuilder;
use crate::common::RejectingRequestBuilder;

fn departments() -> Vec<Row> {
    rows(vec![
        json!({"id": 1, "name": "Eng"}),
        json!({"id": 2, "name": "Sales"}),
        json!({"id": null, "name": "Unassigned"}),
        json!({"id": 3, "name": "Ops"}),
    ])
}

fn employees() -> Vec<Row> {
    rows(vec![
        json!({"name": "alice", "departmentId": 1}),
        json!({"name": "bob", "departmentId": 3}),
        json!({"name": "carol", "departmentId": 1}),
        json!({"name": "dave", "departmentId": null}),
        json!({"name": "erin", "departmentId": 9}),
    ])
}

fn create_operator(join_type: JoinType) -> HashJoinOperator {
    let desc = HashJoinDesc::try_create_with_conditions(join_type, vec![JoinCondition::create(
        "id",
        "departmentId",
    )])
    .unwrap();
    try_create_operator(desc, Settings::create()).unwrap()
}

fn combined(joined: &[JoinedRow]) -> Vec<serde_json::Value> {
    joined
        .iter()
        .map(|j| j.combine("d", "e").unwrap().to_json())
        .collect()
}

fn failing_source(
    head: Vec<Row>,
    message: &'static str,
) -> IterRowSource<impl Iterator<Item = Result<Row>>> {
    IterRowSource::create(
        head.into_iter()
            .map(Ok)
            .chain(std::iter::once(Err(ErrorCode::UpstreamStreamError(message)))),
    )
}

#[test]
fn test_inner_join() {
    let mut operator = create_operator(JoinType::Inner);
    let mut builder = RecordingRequestBuilder::default();

    let joined = operator
        .execute(
            &mut VecRowSource::create(departments()),
            &mut VecRowSource::create(employees()),
            Some(&mut builder),
        )
        .unwrap();

    assert_eq!(combined(&joined), vec![
        json!({"d.id": 1, "d.name": "Eng", "e.name": "alice", "e.departmentId": 1}),
        json!({"d.id": 3, "d.name": "Ops", "e.name": "bob", "e.departmentId": 3}),
        json!({"d.id": 1, "d.name": "Eng", "e.name": "carol", "e.departmentId": 1}),
    ]);
    assert_eq!(builder.attached, vec![vec![vec![PushdownValues {
        field: "departmentId".to_string(),
        values: vec![Scalar::from(1), Scalar::from(2), Scalar::from(3)],
    }]]]);
    assert_eq!(operator.state(), JoinState::Done);
}

#[test]
fn test_state_transitions() {
    let mut operator = create_operator(JoinType::Inner);
    assert_eq!(operator.state(), JoinState::Unbuilt);

    let err = operator.probe(row(json!({"departmentId": 1}))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ILLEGAL_JOIN_STATE);
    assert_eq!(operator.state(), JoinState::Unbuilt);

    operator.add(row(json!({"id": 1, "name": "Eng"}))).unwrap();
    assert_eq!(operator.state(), JoinState::Building);
    operator.add(row(json!({"id": 2, "name": "Sales"}))).unwrap();
    assert_eq!(operator.hash_table().size(), 2);

    let err = operator.finish().unwrap_err();
    assert_eq!(err.code(), ErrorCode::ILLEGAL_JOIN_STATE);

    let mut builder = RecordingRequestBuilder::default();
    operator.build_end(Some(&mut builder)).unwrap();
    assert_eq!(operator.state(), JoinState::Built);
    // Filters are attached before any probe row is looked at.
    assert_eq!(builder.attached.len(), 1);

    let err = operator.add(row(json!({"id": 3}))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ILLEGAL_JOIN_STATE);
    assert_eq!(operator.state(), JoinState::Built);
    assert_eq!(operator.hash_table().size(), 2);

    let err = operator.build_end(None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ILLEGAL_JOIN_STATE);

    let joined = operator.probe(row(json!({"departmentId": 2}))).unwrap();
    assert_eq!(operator.state(), JoinState::Probing);
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].build_side, BuildSide::Left);
    assert_eq!(joined[0].left().map(|r| r.get("name").cloned()), Some(Some(Scalar::from("Sales"))));

    assert!(operator.probe(row(json!({"departmentId": 4}))).unwrap().is_empty());

    assert!(operator.finish().unwrap().is_empty());
    assert_eq!(operator.state(), JoinState::Done);

    let err = operator.probe(row(json!({"departmentId": 1}))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ILLEGAL_JOIN_STATE);
    assert_eq!(operator.state(), JoinState::Done);
}

#[test]
fn test_empty_build_goes_straight_to_built() {
    let mut operator = create_operator(JoinType::Inner);
    let mut builder = RecordingRequestBuilder::default();

    operator.build(&mut VecRowSource::create(vec![])).unwrap();
    assert_eq!(operator.state(), JoinState::Unbuilt);
    operator.build_end(Some(&mut builder)).unwrap();
    assert_eq!(operator.state(), JoinState::Built);

    // The probe side gets an empty IN list: nothing can match.
    assert_eq!(builder.attached, vec![vec![vec![PushdownValues {
        field: "departmentId".to_string(),
        values: vec![],
    }]]]);
}

#[test]
fn test_inner_join_with_empty_build_skips_probe_side() {
    let mut operator = create_operator(JoinType::Inner);
    operator.build_end(None).unwrap();

    let pulled = Cell::new(0);
    let mut probe_source = IterRowSource::create(std::iter::from_fn(|| {
        pulled.set(pulled.get() + 1);
        Some(Ok(row(json!({"departmentId": 1}))))
    }));

    let joined = operator
        .probe_stream(&mut probe_source)
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert!(joined.is_empty());
    assert_eq!(pulled.get(), 0);
    assert_eq!(operator.state(), JoinState::Done);
}

#[test]
fn test_left_outer_join() {
    let mut operator = create_operator(JoinType::LeftOuter);

    let joined = operator
        .execute(
            &mut VecRowSource::create(departments()),
            &mut VecRowSource::create(employees()),
            None,
        )
        .unwrap();

    // Matches in probe order, then unmatched build rows in build order.
    assert_eq!(combined(&joined), vec![
        json!({"d.id": 1, "d.name": "Eng", "e.name": "alice", "e.departmentId": 1}),
        json!({"d.id": 3, "d.name": "Ops", "e.name": "bob", "e.departmentId": 3}),
        json!({"d.id": 1, "d.name": "Eng", "e.name": "carol", "e.departmentId": 1}),
        json!({"d.id": 2, "d.name": "Sales"}),
        json!({"d.id": null, "d.name": "Unassigned"}),
    ]);
    assert!(joined[3].right().is_none());
    assert!(joined[4].probe.is_none());
}

#[test]
fn test_left_outer_join_with_empty_probe() {
    let mut operator = create_operator(JoinType::LeftOuter);

    let joined = operator
        .execute(
            &mut VecRowSource::create(departments()),
            &mut VecRowSource::create(vec![]),
            None,
        )
        .unwrap();
    assert_eq!(joined.len(), 4);
    assert!(joined.iter().all(|j| j.probe.is_none()));
}

#[test]
fn test_build_source_failure() {
    let mut operator = create_operator(JoinType::Inner);

    let mut source = failing_source(departments(), "scroll context expired");
    let err = operator.build(&mut source).unwrap_err();

    // Propagated unchanged.
    assert_eq!(err.code(), ErrorCode::UPSTREAM_STREAM_ERROR);
    assert_eq!(err.message(), "scroll context expired");
    assert_eq!(operator.state(), JoinState::Failed);
    assert!(operator.hash_table().is_empty());

    let err = operator.add(row(json!({"id": 1}))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ILLEGAL_JOIN_STATE);
    assert_eq!(operator.state(), JoinState::Failed);
}

#[test]
fn test_probe_source_failure() {
    let mut operator = create_operator(JoinType::Inner);
    operator
        .build(&mut VecRowSource::create(departments()))
        .unwrap();
    operator.build_end(None).unwrap();

    let mut source = failing_source(employees(), "connection reset");
    let mut stream = operator.probe_stream(&mut source);

    // Rows joined before the failure are still delivered.
    let mut delivered = 0;
    let err = loop {
        match stream.next() {
            Some(Ok(_)) => delivered += 1,
            Some(Err(err)) => break err,
            None => panic!("the stream must end with the upstream error"),
        }
    };
    assert!(stream.next().is_none());
    drop(stream);

    assert_eq!(delivered, 3);
    assert_eq!(err.code(), ErrorCode::UPSTREAM_STREAM_ERROR);
    assert_eq!(operator.state(), JoinState::Failed);
    assert!(operator.hash_table().is_empty());
}

#[test]
fn test_missing_field_during_build() {
    let mut operator = create_operator(JoinType::Inner);
    operator.add(row(json!({"id": 1}))).unwrap();

    let err = operator.add(row(json!({"dept_id": 2}))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MISSING_FIELD);
    assert_eq!(operator.state(), JoinState::Failed);
    assert!(operator.hash_table().is_empty());
}

#[test]
fn test_missing_field_during_probe() {
    let mut operator = create_operator(JoinType::Inner);
    operator.add(row(json!({"id": 1}))).unwrap();
    operator.build_end(None).unwrap();

    let err = operator.probe(row(json!({"dept": 1}))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MISSING_FIELD);
    assert_eq!(operator.state(), JoinState::Failed);
    assert!(operator.hash_table().is_empty());
}

#[test]
fn test_missing_field_at_plan_time() {
    let left = RowSchema::try_create(vec!["id".to_string(), "name".to_string()]).unwrap();
    let right = RowSchema::try_create(vec!["name".to_string(), "dept".to_string()]).unwrap();
    let desc = HashJoinDesc::try_create_with_conditions(JoinType::Inner, vec![
        JoinCondition::create("id", "departmentId"),
    ])
    .unwrap()
    .with_schemas(left, right);

    let err = try_create_operator(desc, Settings::create())
        .err()
        .unwrap();
    assert_eq!(err.code(), ErrorCode::MISSING_FIELD);
}

#[test]
fn test_pushdown_disabled_by_settings() {
    let settings = Settings::create();
    settings.set_enable_join_pushdown(false).unwrap();
    let desc = HashJoinDesc::try_create_with_conditions(JoinType::Inner, vec![
        JoinCondition::create("id", "departmentId"),
    ])
    .unwrap();
    let mut operator = try_create_operator(desc, settings).unwrap();
    let mut builder = RecordingRequestBuilder::default();

    let joined = operator
        .execute(
            &mut VecRowSource::create(departments()),
            &mut VecRowSource::create(employees()),
            Some(&mut builder),
        )
        .unwrap();

    assert_eq!(joined.len(), 3);
    assert!(builder.attached.is_empty());
    assert!(operator.pushdown_packet().is_none());
}

#[test]
fn test_pushdown_threshold_from_settings() {
    let settings = Settings::create();
    settings.set_join_pushdown_values_threshold(2).unwrap();
    let desc = HashJoinDesc::try_create_with_conditions(JoinType::Inner, vec![
        JoinCondition::create("id", "departmentId"),
    ])
    .unwrap();
    let mut operator = try_create_operator(desc, settings).unwrap();
    let mut builder = RecordingRequestBuilder::default();

    operator
        .build(&mut VecRowSource::create(departments()))
        .unwrap();
    operator.build_end(Some(&mut builder)).unwrap();

    let packet = operator.pushdown_packet().unwrap();
    assert_eq!(packet.build_rows, 4);
    assert_eq!(packet.disabled_fields, vec!["departmentId".to_string()]);
    // The only condition lost its filter: the probe side is not filtered.
    assert!(packet.groups.is_empty());
    assert!(builder.attached.is_empty());
}

#[test]
fn test_rejected_pushdown_fails_the_join() {
    let mut operator = create_operator(JoinType::Inner);
    operator
        .build(&mut VecRowSource::create(departments()))
        .unwrap();

    let err = operator
        .build_end(Some(&mut RejectingRequestBuilder))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BAD_ARGUMENTS);
    assert_eq!(operator.state(), JoinState::Failed);
    assert!(operator.hash_table().is_empty());
}

#[test]
fn test_cross_join() {
    let desc = HashJoinDesc::try_create(JoinType::Inner, vec![]).unwrap();
    let mut operator = try_create_operator(desc, Settings::create()).unwrap();
    assert_eq!(operator.hash_table().name(), "ListHashTable");

    let joined = operator
        .execute(
            &mut VecRowSource::create(rows(vec![json!({"a": 1}), json!({"a": 2})])),
            &mut VecRowSource::create(rows(vec![json!({"b": "x"}), json!({"b": "y"})])),
            None,
        )
        .unwrap();

    assert_eq!(combined(&joined), vec![
        json!({"d.a": 1, "e.b": "x"}),
        json!({"d.a": 2, "e.b": "x"}),
        json!({"d.a": 1, "e.b": "y"}),
        json!({"d.a": 2, "e.b": "y"}),
    ]);
}

#[test]
fn test_or_conditions() {
    let desc = HashJoinDesc::try_create(JoinType::Inner, vec![
        vec![JoinCondition::create("id", "departmentId")],
        vec![JoinCondition::create("name", "departmentName")],
    ])
    .unwrap();
    let mut operator = try_create_operator(desc, Settings::create()).unwrap();
    assert_eq!(operator.hash_table().name(), "HashTableGroup");

    let joined = operator
        .execute(
            &mut VecRowSource::create(departments()),
            &mut VecRowSource::create(rows(vec![
                json!({"departmentId": 1, "departmentName": "Eng"}),
                json!({"departmentId": 9, "departmentName": "Unassigned"}),
            ])),
            None,
        )
        .unwrap();

    assert_eq!(combined(&joined), vec![
        json!({"d.id": 1, "d.name": "Eng", "e.departmentId": 1, "e.departmentName": "Eng"}),
        json!({"d.id": null, "d.name": "Unassigned", "e.departmentId": 9, "e.departmentName": "Unassigned"}),
    ]);
}

#[test]
fn test_or_conditions_pushdown_keeps_matching_rows() {
    let desc = HashJoinDesc::try_create(JoinType::Inner, vec![
        vec![JoinCondition::create("id", "departmentId")],
        vec![JoinCondition::create("name", "departmentName")],
    ])
    .unwrap();
    let mut operator = try_create_operator(desc, Settings::create()).unwrap();
    let mut builder = RecordingRequestBuilder::default();

    operator
        .build(&mut VecRowSource::create(departments()))
        .unwrap();
    operator.build_end(Some(&mut builder)).unwrap();

    // One filter group per OR-ed condition group.
    assert_eq!(builder.attached.len(), 1);
    let groups = builder.attached.remove(0);
    assert_eq!(groups, vec![
        vec![PushdownValues {
            field: "departmentId".to_string(),
            values: vec![Scalar::from(1), Scalar::from(2), Scalar::from(3)],
        }],
        vec![PushdownValues {
            field: "departmentName".to_string(),
            values: vec![
                Scalar::from("Eng"),
                Scalar::from("Sales"),
                Scalar::from("Unassigned"),
                Scalar::from("Ops"),
            ],
        }],
    ]);

    let employees = rows(vec![
        json!({"departmentId": 1, "departmentName": "Nobody"}),
        json!({"departmentId": 99, "departmentName": "Sales"}),
        json!({"departmentId": null, "departmentName": "Unassigned"}),
        json!({"departmentId": 2, "departmentName": "Sales"}),
        json!({"departmentId": 42, "departmentName": "Nobody"}),
    ]);

    // A row the join emits is never filtered out on the probe side.
    let mut emitted = 0;
    for employee in employees {
        let kept = eval_pushdown_filters(&groups, &employee);
        let joined = operator.probe(employee).unwrap();
        if !joined.is_empty() {
            emitted += 1;
            assert!(kept);
        }
    }
    assert_eq!(emitted, 4);
}

#[test]
fn test_join_logs_reach_file_sink() {
    let log_file = init_test_logging();
    let mut operator = create_operator(JoinType::Inner);
    operator
        .execute(
            &mut VecRowSource::create(departments()),
            &mut VecRowSource::create(employees()),
            Some(&mut RecordingRequestBuilder::default()),
        )
        .unwrap();
    log::logger().flush();

    let content = std::fs::read_to_string(log_file).unwrap();
    assert!(content.contains("HASH-JOIN: Build phase done"));
    assert!(content.contains("JOIN-PUSHDOWN: Attached 1 filter groups"));
}

#[test]
fn test_build_right_side() {
    let desc = HashJoinDesc::try_create_with_conditions(JoinType::Inner, vec![
        JoinCondition::create("id", "departmentId"),
    ])
    .unwrap()
    .with_build_side(BuildSide::Right)
    .unwrap();
    let mut operator = try_create_operator(desc, Settings::create()).unwrap();
    let mut builder = RecordingRequestBuilder::default();

    // Employees are built, departments are probed.
    let joined = operator
        .execute(
            &mut VecRowSource::create(employees()),
            &mut VecRowSource::create(departments()),
            Some(&mut builder),
        )
        .unwrap();

    assert_eq!(combined(&joined), vec![
        json!({"d.id": 1, "d.name": "Eng", "e.name": "alice", "e.departmentId": 1}),
        json!({"d.id": 1, "d.name": "Eng", "e.name": "carol", "e.departmentId": 1}),
        json!({"d.id": 3, "d.name": "Ops", "e.name": "bob", "e.departmentId": 3}),
    ]);
    assert_eq!(builder.attached, vec![vec![vec![PushdownValues {
        field: "id".to_string(),
        values: vec![Scalar::from(1), Scalar::from(3), Scalar::from(9)],
    }]]]);
}

#[test]
fn test_choose_build_side() {
    let inner = HashJoinDesc::try_create_with_conditions(JoinType::Inner, vec![
        JoinCondition::create("id", "departmentId"),
    ])
    .unwrap();

    assert_eq!(
        inner.choose_build_side(JoinBuildSide::Auto, Some(1000), Some(10)),
        BuildSide::Right
    );
    assert_eq!(
        inner.choose_build_side(JoinBuildSide::Auto, Some(10), Some(10)),
        BuildSide::Left
    );
    assert_eq!(
        inner.choose_build_side(JoinBuildSide::Auto, None, Some(10)),
        BuildSide::Left
    );
    assert_eq!(
        inner.choose_build_side(JoinBuildSide::Right, Some(1), Some(10)),
        BuildSide::Right
    );

    let outer = HashJoinDesc::try_create_with_conditions(JoinType::LeftOuter, vec![
        JoinCondition::create("id", "departmentId"),
    ])
    .unwrap();
    assert_eq!(
        outer.choose_build_side(JoinBuildSide::Right, Some(1000), Some(10)),
        BuildSide::Left
    );

    let err = outer.with_build_side(BuildSide::Right).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BAD_ARGUMENTS);
}

#[test]
fn test_invalid_condition_group() {
    let err = HashJoinDesc::try_create(JoinType::Inner, vec![vec![]]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BAD_ARGUMENTS);
}

#[test]
fn test_close_releases_table() {
    let mut operator = create_operator(JoinType::LeftOuter);
    operator
        .build(&mut VecRowSource::create(departments()))
        .unwrap();
    operator.build_end(None).unwrap();
    operator.probe(row(json!({"departmentId": 1}))).unwrap();

    operator.close();
    assert_eq!(operator.state(), JoinState::Done);
    assert!(operator.hash_table().is_empty());
    assert!(operator.pushdown_packet().is_none());

    // Closing twice is harmless.
    operator.close();
    assert_eq!(operator.state(), JoinState::Done);
}

#[test]
fn test_explain() {
    let mut operator = create_operator(JoinType::Inner);
    operator.add(row(json!({"id": 1}))).unwrap();
    operator.add(row(json!({"id": 1}))).unwrap();
    operator.build_end(None).unwrap();

    assert_eq!(
        operator.explain(),
        json!({
            "join_type": "INNER",
            "build_side": "Left",
            "conditions": "id = departmentId",
            "state": "Built",
            "hash_table": "DefaultHashTable",
            "build_rows": 2,
            "pushdown": {
                "build_rows": 2,
                "groups": [[{"field": "departmentId", "values": [1]}]],
                "disabled_fields": [],
            },
        })
    );
}

#[test]
fn test_combine_duplicate_aliases() {
    let joined = JoinedRow::create(
        Arc::new(row(json!({"id": 1}))),
        Some(Arc::new(row(json!({"id": 1})))),
        BuildSide::Left,
    );

    assert_eq!(
        joined.combine("a", "b").unwrap().to_json(),
        json!({"a.id": 1, "b.id": 1})
    );
    let err = joined.combine("t", "t").unwrap_err();
    assert_eq!(err.code(), ErrorCode::BAD_ARGUMENTS);
}
