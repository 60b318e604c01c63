mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::*;
use dak_faq_canonical::VocabularyCache;
use dak_faq_diagnostics::ErrorCode;
use dak_faq_engine::StaticQuestions;
use dak_faq_types::{
    BatchExecuteResponse, BindingStrength, CanonicalResource, CanonicalType, ExecuteRequest, ParameterSpec, ParameterType,
    QuestionDefinition, QuestionLevel,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use serde_json::json;
use std::sync::atomic::Ordering;

fn answering(id: &str) -> dak_faq_engine::QuestionModule {
    module(
        QuestionDefinition::new(id, QuestionLevel::Project, id),
        Script::Answer(json!({"id": id})),
    )
}

#[tokio::test]
async fn test_unknown_question_is_not_found() {
    let h = harness(StaticQuestions::new("t"), default_fetcher());
    let response = h
        .engine
        .execute_single(&ExecuteRequest::new("nope"), &h.context)
        .await;

    assert!(!response.is_success());
    assert_eq!(response.question_id(), "nope");
    assert_eq!(response.error_code(), Some(ErrorCode::NotFound));
}

#[tokio::test]
async fn test_batch_isolates_unknown_question() {
    let h = harness(
        StaticQuestions::new("t")
            .with_module(answering("one"))
            .with_module(answering("two")),
        default_fetcher(),
    );
    let requests = vec![
        ExecuteRequest::new("one"),
        ExecuteRequest::new("missing"),
        ExecuteRequest::new("two"),
    ];

    let results = h.engine.execute_batch(&requests, &h.context).await;
    assert_eq!(results.len(), 3);
    let failures: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error_code(), Some(ErrorCode::NotFound));

    let batch = BatchExecuteResponse::from_results(results);
    assert!(batch.success);
    assert_eq!(batch.summary.total, 3);
    assert_eq!(batch.summary.failed, 1);
    assert_eq!(batch.results[2].question_id(), "two");
}

#[tokio::test]
async fn test_failing_and_panicking_executors_are_contained() {
    let h = harness(
        StaticQuestions::new("t")
            .with_module(answering("ok"))
            .with_module(module(
                QuestionDefinition::new("fails", QuestionLevel::Project, "fails"),
                Script::Fail("disk on fire"),
            ))
            .with_module(module(
                QuestionDefinition::new("panics", QuestionLevel::Project, "panics"),
                Script::Panic("index out of bounds"),
            )),
        default_fetcher(),
    );
    let requests: Vec<_> = ["panics", "ok", "fails", "ok"]
        .into_iter()
        .map(ExecuteRequest::new)
        .collect();

    let results = h.engine.execute_batch(&requests, &h.context).await;
    let codes: Vec<_> = results.iter().map(|r| r.error_code()).collect();
    assert_eq!(
        codes,
        vec![Some(ErrorCode::ExecutionError), None, Some(ErrorCode::ExecutionError), None]
    );
    assert!(results[0].error().unwrap().message.contains("index out of bounds"));
    assert_eq!(results[2].error().unwrap().message, "disk on fire");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_batch_preserves_order() {
    let mut questions = StaticQuestions::new("t");
    for i in 0..8 {
        questions = questions.with_module(answering(&format!("q{}", i)));
    }
    let h = harness(questions, default_fetcher());
    let engine = h.engine.with_batch_concurrency(4);

    let requests: Vec<_> = (0..8).rev().map(|i| ExecuteRequest::new(format!("q{}", i))).collect();
    let results = engine.execute_batch(&requests, &h.context).await;

    let ids: Vec<_> = results.iter().map(|r| r.question_id().to_string()).collect();
    let expected: Vec<_> = (0..8).rev().map(|i| format!("q{}", i)).collect();
    assert_eq!(ids, expected);
    assert!(results.iter().all(|r| r.is_success()));
}

#[rstest]
#[case(BindingStrength::Required, "a", true, 0)]
#[case(BindingStrength::Required, "c", false, 0)]
#[case(BindingStrength::Extensible, "a", true, 0)]
#[case(BindingStrength::Extensible, "c", true, 1)]
#[case(BindingStrength::Preferred, "c", true, 0)]
#[case(BindingStrength::Example, "c", true, 0)]
#[tokio::test]
async fn test_binding_strength_policy(
    #[case] strength: BindingStrength,
    #[case] code: &str,
    #[case] accepted: bool,
    #[case] warnings: usize,
) {
    let (executor, runs) = Scripted::new(Script::Answer(json!({})));
    let h = harness(
        StaticQuestions::new("t").with_module(dak_faq_engine::QuestionModule::new(
            bound_question("q", strength, CODES_VS),
            executor,
        )),
        default_fetcher(),
    );

    let response = h
        .engine
        .execute_single(&ExecuteRequest::new("q").with_parameter("code", code), &h.context)
        .await;

    assert_eq!(response.is_success(), accepted);
    if accepted {
        assert_eq!(response.result().unwrap().warnings.len(), warnings);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    } else {
        assert_eq!(response.error_code(), Some(ErrorCode::ValidationError));
        assert_eq!(response.error().unwrap().details.len(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_component_type_round_trip() {
    let definition = QuestionDefinition::new("components", QuestionLevel::Project, "Components")
        .with_parameter(
            ParameterSpec::required("componentType", ParameterType::String).with_binding(
                dak_faq_types::ValueSetBinding::required(COMPONENTS_VS),
            ),
        );
    let h = harness(
        StaticQuestions::new("t").with_module(module(definition, Script::Echo)),
        default_fetcher(),
    );

    let ok = h
        .engine
        .execute_single(
            &ExecuteRequest::new("components").with_parameter("componentType", "business-processes"),
            &h.context,
        )
        .await;
    assert!(ok.is_success());
    let result = ok.result().unwrap();
    assert_eq!(result.structured["parameters"]["componentType"], "business-processes");
    assert_eq!(result.meta["questionId"], "components");
    assert!(result.meta.contains_key("executedAt"));
    assert!(result.meta.contains_key("durationMs"));

    let rejected = h
        .engine
        .execute_single(
            &ExecuteRequest::new("components").with_parameter("componentType", "unknown-type"),
            &h.context,
        )
        .await;
    assert!(!rejected.is_success());
    assert_eq!(rejected.error_code(), Some(ErrorCode::ValidationError));
    assert_eq!(h.fetcher.request_count(), 1);
}

#[tokio::test]
async fn test_unreachable_required_value_set_is_permissive() {
    let h = harness(
        StaticQuestions::new("t").with_module(module(
            bound_question("q", BindingStrength::Required, MISSING_VS),
            Script::Answer(json!({})),
        )),
        default_fetcher(),
    );
    let response = h
        .engine
        .execute_single(&ExecuteRequest::new("q").with_parameter("code", "anything"), &h.context)
        .await;

    assert!(response.is_success());
    let warnings = &response.result().unwrap().warnings;
    assert!(warnings.iter().any(|w| w.contains("accepted without validation")));
}

#[tokio::test]
async fn test_stale_required_value_set_is_still_enforced() {
    let cache = VocabularyCache::in_memory();
    let stale = CanonicalResource::new(
        CODES_VS,
        CanonicalType::ValueSet,
        json!({"type": "string", "enum": ["a", "b"]}),
    )
    .with_last_fetched(Utc::now() - ChronoDuration::hours(30));
    cache.put(CODES_VS, &stale).await;

    let fetcher = MapFetcher::new();
    fetcher.set_offline(true);
    let h = harness_with_cache(
        StaticQuestions::new("t").with_module(module(
            bound_question("q", BindingStrength::Required, CODES_VS),
            Script::Answer(json!({})),
        )),
        fetcher,
        cache,
    );

    let rejected = h
        .engine
        .execute_single(&ExecuteRequest::new("q").with_parameter("code", "c"), &h.context)
        .await;
    assert_eq!(rejected.error_code(), Some(ErrorCode::ValidationError));

    let accepted = h
        .engine
        .execute_single(&ExecuteRequest::new("q").with_parameter("code", "a"), &h.context)
        .await;
    assert!(accepted.is_success());
    let warnings = &accepted.result().unwrap().warnings;
    assert!(warnings.iter().any(|w| w.contains("using cached copy")));
    assert!(h.fetcher.request_count() >= 2);
}

#[tokio::test]
async fn test_array_values_are_checked_individually() {
    let definition = QuestionDefinition::new("multi", QuestionLevel::Project, "multi").with_parameter(
        ParameterSpec::new("codes", ParameterType::Array)
            .with_binding(dak_faq_types::ValueSetBinding::required(CODES_VS)),
    );
    let h = harness(
        StaticQuestions::new("t").with_module(module(definition, Script::Echo)),
        default_fetcher(),
    );

    let ok = h
        .engine
        .execute_single(
            &ExecuteRequest::new("multi").with_parameter("codes", json!(["a", "b"])),
            &h.context,
        )
        .await;
    assert!(ok.is_success());

    let bad = h
        .engine
        .execute_single(
            &ExecuteRequest::new("multi").with_parameter("codes", json!(["a", "z", 3])),
            &h.context,
        )
        .await;
    assert_eq!(bad.error_code(), Some(ErrorCode::ValidationError));
}

#[tokio::test]
async fn test_parameter_checks_and_defaults() {
    let definition = QuestionDefinition::new("p", QuestionLevel::Project, "p")
        .with_parameter(ParameterSpec::required("name", ParameterType::String).with_pattern("^[a-z-]+$"))
        .with_parameter(ParameterSpec::new("limit", ParameterType::Integer).with_default(json!(10)));
    let h = harness(
        StaticQuestions::new("t").with_module(module(definition, Script::Echo)),
        default_fetcher(),
    );
    let validate = |parameters: serde_json::Value| {
        let schemas = h.schemas.clone();
        async move {
            let parameters: dak_faq_types::JsonMap = serde_json::from_value(parameters).unwrap();
            schemas.validate_question_parameters("p", &parameters).await.unwrap()
        }
    };

    let missing = validate(json!({})).await;
    assert_eq!(missing.error_messages(), vec!["name: required parameter is missing"]);

    let wrong_type = validate(json!({"name": "ok", "limit": "ten"})).await;
    assert_eq!(wrong_type.error_messages(), vec!["limit: expected integer, found string"]);

    let bad_pattern = validate(json!({"name": "Not OK"})).await;
    assert!(!bad_pattern.is_valid);

    let unknown = validate(json!({"name": "ok", "extra": 1})).await;
    assert!(unknown.is_valid);
    assert_eq!(unknown.warning_messages(), vec!["extra: unknown parameter ignored"]);

    let response = h
        .engine
        .execute_single(&ExecuteRequest::new("p").with_parameter("name", "ok"), &h.context)
        .await;
    assert_eq!(response.result().unwrap().structured["parameters"]["limit"], 10);
}

#[tokio::test]
async fn test_asset_files_reach_the_executor() {
    let h = harness(
        StaticQuestions::new("t").with_module(module(
            QuestionDefinition::new("f", QuestionLevel::File, "f"),
            Script::Echo,
        )),
        default_fetcher(),
    );
    let response = h
        .engine
        .execute_single(
            &ExecuteRequest::new("f").with_asset_files(["input/a.bpmn"]),
            &h.context,
        )
        .await;
    assert_eq!(
        response.result().unwrap().structured["assetFiles"],
        json!(["input/a.bpmn"])
    );
}

proptest! {
    #[test]
    fn prop_batch_summary_counts(outcomes in prop::collection::vec(any::<bool>(), 0..32)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let h = harness(StaticQuestions::new("t").with_module(answering("known")), default_fetcher());
        let requests: Vec<_> = outcomes
            .iter()
            .map(|known| ExecuteRequest::new(if *known { "known" } else { "unknown" }))
            .collect();

        let results = runtime.block_on(h.engine.execute_batch(&requests, &h.context));
        let batch = BatchExecuteResponse::from_results(results);

        prop_assert!(batch.success);
        prop_assert_eq!(batch.summary.total, outcomes.len());
        prop_assert_eq!(batch.summary.successful + batch.summary.failed, batch.summary.total);
        prop_assert_eq!(batch.results.len(), batch.summary.total);
        prop_assert_eq!(batch.summary.successful, outcomes.iter().filter(|k| **k).count());
    }
}
