//! API request handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Days, NaiveDate};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};

use vigil_types::{ProposalLog, RewardRecord, Timestamp};

use crate::error::RpcError;
use crate::server::RpcState;

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Proposals ────────────────────────────────────────────────────────────

/// Inclusive UTC date range, `YYYY-MM-DD`. Either bound may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, RpcError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RpcError::InvalidRequest(format!("{field} must be YYYY-MM-DD, got {value:?}")))
}

impl DateRange {
    /// First and last second covered by the range.
    pub fn bounds(&self) -> Result<(Timestamp, Timestamp), RpcError> {
        let from = match &self.start {
            Some(start) => Timestamp::start_of(parse_date("start", start)?),
            None => Timestamp::EPOCH,
        };
        let to = match &self.end {
            Some(end) => {
                let next_day = parse_date("end", end)?
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| RpcError::InvalidRequest(format!("end out of range: {end}")))?;
                Timestamp::new(Timestamp::start_of(next_day).as_secs().saturating_sub(1))
            }
            None => Timestamp::new(u64::MAX),
        };
        if from > to {
            return Err(RpcError::InvalidRequest("start is after end".to_string()));
        }
        Ok((from, to))
    }
}

#[derive(Serialize)]
pub struct ProposalsResponse {
    pub proposals: Vec<ProposalLog>,
}

pub async fn list_proposals(
    State(state): State<RpcState>,
    Query(range): Query<DateRange>,
) -> Result<Json<ProposalsResponse>, RpcError> {
    let (from, to) = range.bounds()?;
    let proposals = state.stores.proposals.list_proposal_logs(None, from, to)?;
    Ok(Json(ProposalsResponse { proposals }))
}

pub async fn network_proposals(
    State(state): State<RpcState>,
    Path(network): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<ProposalsResponse>, RpcError> {
    let (from, to) = range.bounds()?;
    let proposals = state
        .stores
        .proposals
        .list_proposal_logs(Some(&network), from, to)?;
    Ok(Json(ProposalsResponse { proposals }))
}

// ── Rewards ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RewardsQuery {
    pub chain_id: Option<String>,
    /// Period key, e.g. `2024-05-01`.
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct RewardsResponse {
    pub rewards: Vec<RewardRecord>,
}

pub async fn list_rewards(
    State(state): State<RpcState>,
    Query(query): Query<RewardsQuery>,
) -> Result<Json<RewardsResponse>, RpcError> {
    let chain_id = query
        .chain_id
        .filter(|c| !c.is_empty())
        .ok_or_else(|| RpcError::InvalidRequest("chain_id is required".to_string()))?;
    if let Some(date) = &query.date {
        parse_date("date", date)?;
    }
    let rewards = state
        .stores
        .rewards
        .list_rewards(&chain_id, query.date.as_deref())?;
    Ok(Json(RewardsResponse { rewards }))
}

// ── Metrics ──────────────────────────────────────────────────────────────

pub async fn metrics(State(state): State<RpcState>) -> Result<Response, RpcError> {
    let Some(registry) = &state.metrics else {
        return Err(RpcError::NotFound("metrics are disabled".to_string()));
    };
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}
