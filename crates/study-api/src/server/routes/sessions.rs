#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    condition_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateSessionResponse {
    schema_version: String,
    session: SessionSnapshot,
    condition: ConditionConfig,
}

async fn create_session(
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> Result<Json<CreateSessionResponse>, HttpApiError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();

    let (session, condition) = {
        let mut inner = state.inner.lock().await;
        inner
            .create_session(request.condition_id.as_deref(), &mut rand::rng())
            .map_err(HttpApiError::from_registry)?
    };

    Ok(Json(CreateSessionResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        session,
        condition,
    }))
}

async fn get_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, HttpApiError> {
    let inner = state.inner.lock().await;
    inner
        .session(&session_id)
        .map(Json)
        .map_err(HttpApiError::from_registry)
}

#[derive(Debug, Serialize)]
struct StageResponse {
    schema_version: String,
    session_id: String,
    stage: String,
    config: ConditionConfig,
}

async fn get_stage(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StageResponse>, HttpApiError> {
    let config = {
        let inner = state.inner.lock().await;
        inner
            .stage_condition(&session_id)
            .map_err(HttpApiError::from_registry)?
    };

    Ok(Json(StageResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        session_id,
        stage: config.condition_id.clone(),
        config,
    }))
}

async fn get_progress(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StageProgress>, HttpApiError> {
    let inner = state.inner.lock().await;
    inner
        .progress(&session_id)
        .map(Json)
        .map_err(HttpApiError::from_registry)
}
