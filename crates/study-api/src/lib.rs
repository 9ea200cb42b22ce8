//! Session registry and HTTP facade over the study engine.
//!
//! The registry owns the engine plus every enrolled participant session and
//! is the single mutable state behind the server. Random draws are injected
//! by the caller, so registry behavior is fully reproducible in tests.

mod server;

use std::collections::BTreeMap;
use std::fmt;

use contracts::{
    Allocation, ConditionConfig, EvaluationResult, SessionSnapshot, StageProgress, TrustOutcome,
    SCHEMA_VERSION_V1,
};
use rand::Rng;
use study_core::{EngineError, StudyEngine};

pub use server::{serve, ServerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    SessionNotFound { session_id: String },
    EmptyCatalog,
    Engine(EngineError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound { session_id } => write!(f, "unknown session: {session_id}"),
            Self::EmptyCatalog => write!(f, "condition catalog has no usable entries"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<EngineError> for RegistryError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParticipantSession {
    session_id: String,
    condition_id: String,
    current_stage: String,
    experiment_complete: bool,
}

impl ParticipantSession {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            session_id: self.session_id.clone(),
            condition_id: self.condition_id.clone(),
            current_stage: self.current_stage.clone(),
            experiment_complete: self.experiment_complete,
        }
    }
}

/// One allocation round as seen by a session: the evaluation plus the
/// sequencer's verdict on where the session goes next.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRound {
    pub result: EvaluationResult,
    pub next_stage: Option<String>,
    pub experiment_complete: bool,
}

#[derive(Debug)]
pub struct SessionRegistry {
    engine: StudyEngine,
    sessions: BTreeMap<String, ParticipantSession>,
    next_session_number: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            engine: StudyEngine::new(),
            sessions: BTreeMap::new(),
            next_session_number: 1,
        }
    }

    pub fn engine(&self) -> &StudyEngine {
        &self.engine
    }

    /// Enroll a participant. Without a pinned condition the trust condition
    /// is drawn uniformly; the allocation sequence always starts at the
    /// first stage.
    pub fn create_session(
        &mut self,
        condition_id: Option<&str>,
        rng: &mut impl Rng,
    ) -> Result<(SessionSnapshot, ConditionConfig), RegistryError> {
        let condition = match condition_id {
            Some(requested) => self.engine.trust_condition(requested)?.clone(),
            None => self
                .engine
                .assign_condition(rng)
                .ok_or(RegistryError::EmptyCatalog)?
                .clone(),
        };
        let first_stage = self
            .engine
            .first_stage()
            .ok_or(RegistryError::EmptyCatalog)?
            .to_string();

        let session_id = format!("session_{:04}", self.next_session_number);
        self.next_session_number += 1;

        let session = ParticipantSession {
            session_id: session_id.clone(),
            condition_id: condition.condition_id.clone(),
            current_stage: first_stage,
            experiment_complete: false,
        };
        let snapshot = session.snapshot();
        self.sessions.insert(session_id, session);

        Ok((snapshot, condition))
    }

    pub fn session(&self, session_id: &str) -> Result<SessionSnapshot, RegistryError> {
        Ok(self.require_session(session_id)?.snapshot())
    }

    /// Condition config for the session's current allocation stage.
    pub fn stage_condition(&self, session_id: &str) -> Result<ConditionConfig, RegistryError> {
        let session = self.require_session(session_id)?;
        Ok(self
            .engine
            .catalog()
            .stage(&session.current_stage)?
            .clone())
    }

    pub fn progress(&self, session_id: &str) -> Result<StageProgress, RegistryError> {
        let session = self.require_session(session_id)?;
        let (index, total) = self.engine.stage_position(&session.current_stage);
        let progress = if total == 0 {
            0.0
        } else {
            (index + 1) as f64 / total as f64 * 100.0
        };
        Ok(StageProgress {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            session_id: session.session_id.clone(),
            current_stage: session.current_stage.clone(),
            progress,
            total_stages: total,
        })
    }

    /// Play a trust round under the session's assigned condition. Trust play
    /// never advances the allocation sequence.
    pub fn play_trust(
        &self,
        session_id: &str,
        buyer_choice: &str,
        seller_choice: Option<&str>,
        fixed_shock: Option<i64>,
        rng: &mut impl Rng,
    ) -> Result<(String, TrustOutcome), RegistryError> {
        let condition_id = self.require_session(session_id)?.condition_id.clone();
        let outcome =
            self.engine
                .play_trust(&condition_id, buyer_choice, seller_choice, fixed_shock, rng)?;
        Ok((condition_id, outcome))
    }

    /// Evaluate an allocation for the session's current stage. Valid rounds
    /// advance the sequence; invalid rounds hold the stage so the
    /// participant retries the same frame.
    pub fn play_allocation(
        &mut self,
        session_id: &str,
        allocation: &Allocation,
        fixed_shock: Option<i64>,
        rng: &mut impl Rng,
    ) -> Result<AllocationRound, RegistryError> {
        let (current_stage, already_complete) = {
            let session = self.require_session(session_id)?;
            (session.current_stage.clone(), session.experiment_complete)
        };

        let result = self
            .engine
            .evaluate_stage_allocation(&current_stage, allocation, fixed_shock, rng)?;

        if !result.valid {
            return Ok(AllocationRound {
                result,
                next_stage: None,
                experiment_complete: already_complete,
            });
        }

        let next_stage = self.engine.next_stage(&current_stage).map(str::to_string);
        let session = self.require_session_mut(session_id)?;
        match &next_stage {
            Some(stage) => session.current_stage = stage.clone(),
            None => session.experiment_complete = true,
        }

        Ok(AllocationRound {
            result,
            next_stage,
            experiment_complete: session.experiment_complete,
        })
    }

    /// Round for a payload that never parsed into amounts. Nothing is
    /// played: the stage holds and the completion flag reports the session
    /// unchanged.
    pub fn rejected_allocation(
        &self,
        session_id: &str,
        message: impl Into<String>,
    ) -> Result<AllocationRound, RegistryError> {
        let session = self.require_session(session_id)?;
        let condition = self.engine.catalog().stage(&session.current_stage)?;
        Ok(AllocationRound {
            result: study_core::allocation::rejected_payload(condition, message),
            next_stage: None,
            experiment_complete: session.experiment_complete,
        })
    }

    pub fn evaluate_portfolio(
        &self,
        allocation: &Allocation,
        fixed_shock: Option<i64>,
        rng: &mut impl Rng,
    ) -> Result<EvaluationResult, RegistryError> {
        Ok(self.engine.evaluate_portfolio(allocation, fixed_shock, rng)?)
    }

    pub fn portfolio_condition(&self) -> Result<ConditionConfig, RegistryError> {
        Ok(self
            .engine
            .catalog()
            .condition(study_core::PORTFOLIO_CONDITION_ID)?
            .clone())
    }

    pub fn conditions(&self) -> Vec<ConditionConfig> {
        self.engine.catalog().conditions().cloned().collect()
    }

    pub fn stage_order(&self) -> Vec<String> {
        self.engine.catalog().stage_order().to_vec()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn require_session(&self, session_id: &str) -> Result<&ParticipantSession, RegistryError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| RegistryError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }

    fn require_session_mut(
        &mut self,
        session_id: &str,
    ) -> Result<&mut ParticipantSession, RegistryError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| RegistryError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
