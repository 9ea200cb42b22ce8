#[derive(Debug, Deserialize)]
struct TrustPlayRequest {
    buyer_choice: String,
    seller_choice: Option<String>,
    shock_amount: Option<i64>,
}

#[derive(Debug, Serialize)]
struct TrustPlayResponse {
    schema_version: String,
    session_id: String,
    condition: String,
    #[serde(flatten)]
    outcome: TrustOutcome,
}

async fn play_trust(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<TrustPlayRequest>,
) -> Result<Json<TrustPlayResponse>, HttpApiError> {
    let (condition, outcome) = {
        let inner = state.inner.lock().await;
        inner
            .play_trust(
                &session_id,
                &request.buyer_choice,
                request.seller_choice.as_deref(),
                request.shock_amount,
                &mut rand::rng(),
            )
            .map_err(HttpApiError::from_registry)?
    };

    Ok(Json(TrustPlayResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        session_id,
        condition,
        outcome,
    }))
}

#[derive(Debug, Serialize)]
struct AllocationPlayResponse {
    schema_version: String,
    session_id: String,
    game_analysis: EvaluationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_stage: Option<String>,
    experiment_complete: bool,
}

async fn play_allocation(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<AllocationPlayResponse>, HttpApiError> {
    let entries = require_allocation_entries(&body)?;

    let mut inner = state.inner.lock().await;
    let condition = inner
        .stage_condition(&session_id)
        .map_err(HttpApiError::from_registry)?;
    let categories = condition.allocation_categories().unwrap_or_default();

    let round = match parse_allocation_payload(entries, categories) {
        Ok(payload) => inner
            .play_allocation(
                &session_id,
                &payload.allocation,
                payload.shock_amount,
                &mut rand::rng(),
            )
            .map_err(HttpApiError::from_registry)?,
        Err(message) => inner
            .rejected_allocation(&session_id, message)
            .map_err(HttpApiError::from_registry)?,
    };

    Ok(Json(AllocationPlayResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        session_id,
        game_analysis: round.result,
        next_stage: round.next_stage,
        experiment_complete: round.experiment_complete,
    }))
}

#[derive(Debug, Serialize)]
struct PortfolioEvaluateResponse {
    schema_version: String,
    game_analysis: EvaluationResult,
}

async fn evaluate_portfolio(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<PortfolioEvaluateResponse>, HttpApiError> {
    let entries = require_allocation_entries(&body)?;

    let inner = state.inner.lock().await;
    let condition = inner
        .portfolio_condition()
        .map_err(HttpApiError::from_registry)?;
    let categories = condition.allocation_categories().unwrap_or_default();

    let result = match parse_allocation_payload(entries, categories) {
        Ok(payload) => inner
            .evaluate_portfolio(&payload.allocation, payload.shock_amount, &mut rand::rng())
            .map_err(HttpApiError::from_registry)?,
        Err(message) => study_core::allocation::rejected_payload(&condition, message),
    };

    Ok(Json(PortfolioEvaluateResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        game_analysis: result,
    }))
}

fn require_allocation_entries(body: &Value) -> Result<&Map<String, Value>, HttpApiError> {
    let Some(entries) = body.as_object() else {
        return Err(HttpApiError::invalid_request(
            "request body must be a JSON object",
            None,
        ));
    };
    if !entries
        .keys()
        .any(|key| key.starts_with(ALLOCATION_KEY_PREFIX))
    {
        return Err(HttpApiError::invalid_request(
            "request contains no allocation entries",
            Some(format!("expected keys prefixed with {ALLOCATION_KEY_PREFIX}")),
        ));
    }
    Ok(entries)
}

#[derive(Debug, Serialize)]
struct ListConditionsResponse {
    schema_version: String,
    conditions: Vec<ConditionConfig>,
    stage_order: Vec<String>,
}

async fn list_conditions(State(state): State<AppState>) -> Json<ListConditionsResponse> {
    let inner = state.inner.lock().await;
    Json(ListConditionsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        conditions: inner.conditions(),
        stage_order: inner.stage_order(),
    })
}
