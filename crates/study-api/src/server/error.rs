#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn session_not_found(session_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new(
                ErrorCode::SessionNotFound,
                "session_id does not match a known session",
                Some(format!("session_id={session_id}")),
            ),
        }
    }

    fn condition_not_found(condition_id: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(
                ErrorCode::ConditionNotFound,
                "condition_id does not match a catalog entry",
                Some(format!("condition_id={condition_id}")),
            ),
        }
    }

    fn stage_not_configured(stage_id: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(
                ErrorCode::StageNotFound,
                "session references a stage missing from the catalog",
                Some(format!("stage_id={stage_id}")),
            ),
        }
    }

    fn invalid_choice(field: &str, token: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(
                ErrorCode::InvalidChoice,
                format!("{field} is not a recognized choice"),
                Some(format!("{field}={token}")),
            ),
        }
    }

    fn condition_mismatch(condition_id: &str, expected: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(
                ErrorCode::ConditionMismatch,
                format!("condition does not support {expected} play"),
                Some(format!("condition_id={condition_id}")),
            ),
        }
    }

    fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidRequest, message, details),
        }
    }

    fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(ErrorCode::InternalError, message, details),
        }
    }

    fn from_registry(err: RegistryError) -> Self {
        match err {
            RegistryError::SessionNotFound { session_id } => Self::session_not_found(&session_id),
            RegistryError::EmptyCatalog => {
                Self::internal("condition catalog has no usable entries", None)
            }
            RegistryError::Engine(EngineError::UnknownCondition { condition_id }) => {
                Self::condition_not_found(&condition_id)
            }
            RegistryError::Engine(EngineError::UnknownStage { stage_id }) => {
                Self::stage_not_configured(&stage_id)
            }
            RegistryError::Engine(EngineError::ConditionMismatch {
                condition_id,
                expected,
            }) => Self::condition_mismatch(&condition_id, expected),
            RegistryError::Engine(EngineError::InvalidChoice { field, token }) => {
                Self::invalid_choice(field, &token)
            }
            RegistryError::Engine(EngineError::ShockOutOfRange { shock_amount }) => {
                Self::invalid_request(
                    "shock_amount is outside the playable range",
                    Some(format!("shock_amount={shock_amount}")),
                )
            }
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
