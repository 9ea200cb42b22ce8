use super::*;

use serde_json::json;

fn portfolio_categories(registry: &SessionRegistry) -> Vec<String> {
    registry
        .portfolio_condition()
        .expect("portfolio condition should exist")
        .allocation_categories()
        .expect("portfolio takes allocations")
        .to_vec()
}

fn budget_categories(registry: &SessionRegistry) -> Vec<String> {
    registry
        .engine()
        .catalog()
        .stage("baseline")
        .expect("baseline stage should exist")
        .allocation_categories()
        .expect("stages take allocations")
        .to_vec()
}

#[test]
fn parse_strips_the_prefix_and_canonicalizes_categories() {
    let registry = SessionRegistry::new();
    let categories = portfolio_categories(&registry);

    let body = json!({
        "allocation_ai_research": 4000,
        "allocation_sustainable_tech": "2500",
        "stage": "ignored",
    });
    let payload = parse_allocation_payload(body.as_object().expect("object"), &categories)
        .expect("payload should parse");

    assert_eq!(payload.allocation.get("AI Research"), Some(&4000));
    assert_eq!(payload.allocation.get("Sustainable Tech"), Some(&2500));
    assert_eq!(payload.allocation.len(), 2);
    assert_eq!(payload.shock_amount, None);
}

#[test]
fn parse_rejects_non_numeric_amounts_with_the_category_in_the_message() {
    let registry = SessionRegistry::new();
    let categories = budget_categories(&registry);

    let body = json!({ "allocation_savings": "lots" });
    let err = parse_allocation_payload(body.as_object().expect("object"), &categories).unwrap_err();
    assert_eq!(err, "Invalid amount for savings");

    let body = json!({ "allocation_savings": 12.5 });
    let err = parse_allocation_payload(body.as_object().expect("object"), &categories).unwrap_err();
    assert_eq!(err, "Invalid amount for savings");
}

#[test]
fn parse_reads_the_optional_pinned_shock() {
    let registry = SessionRegistry::new();
    let categories = budget_categories(&registry);

    let body = json!({ "allocation_savings": 10, "shock_amount": "1500" });
    let payload = parse_allocation_payload(body.as_object().expect("object"), &categories)
        .expect("payload should parse");
    assert_eq!(payload.shock_amount, Some(1500));

    let body = json!({ "allocation_savings": 10, "shock_amount": null });
    let payload = parse_allocation_payload(body.as_object().expect("object"), &categories)
        .expect("payload should parse");
    assert_eq!(payload.shock_amount, None);

    let body = json!({ "allocation_savings": 10, "shock_amount": "later" });
    let err = parse_allocation_payload(body.as_object().expect("object"), &categories).unwrap_err();
    assert_eq!(err, "Invalid shock_amount");
}

#[test]
fn unmatched_category_suffixes_fall_back_to_title_case() {
    let registry = SessionRegistry::new();
    let categories = portfolio_categories(&registry);

    assert_eq!(canonical_category("ai_research", &categories), "AI Research");
    assert_eq!(canonical_category("crypto_stuff", &categories), "Crypto Stuff");
}

#[test]
fn bodies_without_allocation_keys_are_bad_requests() {
    let err = require_allocation_entries(&json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.error.error_code, ErrorCode::InvalidRequest);

    let err = require_allocation_entries(&json!({ "stage": "baseline" })).unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.error.error_code, ErrorCode::InvalidRequest);

    let body = json!({ "allocation_savings": 10 });
    assert!(require_allocation_entries(&body).is_ok());
}

#[test]
fn registry_errors_map_onto_the_documented_statuses() {
    let err = HttpApiError::from_registry(RegistryError::SessionNotFound {
        session_id: "session_0042".to_string(),
    });
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.error.error_code, ErrorCode::SessionNotFound);
    assert_eq!(err.error.details.as_deref(), Some("session_id=session_0042"));

    let err = HttpApiError::from_registry(RegistryError::Engine(EngineError::UnknownCondition {
        condition_id: "Z".to_string(),
    }));
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.error.error_code, ErrorCode::ConditionNotFound);

    let err = HttpApiError::from_registry(RegistryError::Engine(EngineError::UnknownStage {
        stage_id: "stage_nine".to_string(),
    }));
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.error.error_code, ErrorCode::StageNotFound);

    let err = HttpApiError::from_registry(RegistryError::Engine(EngineError::InvalidChoice {
        field: "buyer_choice",
        token: "Maybe".to_string(),
    }));
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.error.error_code, ErrorCode::InvalidChoice);
    assert_eq!(err.error.details.as_deref(), Some("buyer_choice=Maybe"));

    let err = HttpApiError::from_registry(RegistryError::Engine(EngineError::ConditionMismatch {
        condition_id: "baseline".to_string(),
        expected: "trust",
    }));
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.error.error_code, ErrorCode::ConditionMismatch);

    let err = HttpApiError::from_registry(RegistryError::Engine(EngineError::ShockOutOfRange {
        shock_amount: i64::MIN,
    }));
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.error.error_code, ErrorCode::InvalidRequest);
    assert_eq!(
        err.error.details.as_deref(),
        Some("shock_amount=-9223372036854775808")
    );

    let err = HttpApiError::from_registry(RegistryError::EmptyCatalog);
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.error.error_code, ErrorCode::InternalError);
}

#[test]
fn cors_headers_cover_the_browser_preflight() {
    let mut headers = axum::http::HeaderMap::new();
    apply_cors_headers(&mut headers);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-methods"],
        "GET,POST,OPTIONS,PUT,PATCH,DELETE"
    );
    assert_eq!(headers["access-control-max-age"], "3600");
}

#[test]
fn router_builds_with_fresh_state() {
    let _app = router(AppState::new());
}
