use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CalendarDay, PageOutcome, WindowState};
use crate::services::{
    clock::{Clock, SystemClock},
    horizon::HorizonService,
    paginator::WeekPaginator,
    queue::QueueClassifier,
    slots::SlotGridService,
    source::{AppointmentSource, SupabaseAppointmentSource},
};

#[derive(Debug, Deserialize)]
pub struct HorizonQuery {
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct NowQuery {
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct SelectDayRequest {
    pub state: WindowState,
    pub day: CalendarDay,
}

#[derive(Debug, Deserialize)]
pub struct SelectIndexRequest {
    pub state: WindowState,
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub state: WindowState,
}

#[derive(Debug, Serialize)]
pub struct WindowResponse {
    pub state: WindowState,
    pub visible_days: Vec<CalendarDay>,
    pub can_page_forward: bool,
    pub can_page_backward: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PageOutcome>,
}

impl WindowResponse {
    fn from_paginator(paginator: &WeekPaginator, outcome: Option<PageOutcome>) -> Self {
        Self {
            state: paginator.state(),
            visible_days: paginator.visible_days().to_vec(),
            can_page_forward: paginator.can_page_forward(),
            can_page_backward: paginator.can_page_backward(),
            outcome,
        }
    }
}

fn resolve_now(now: Option<NaiveDateTime>) -> NaiveDateTime {
    now.unwrap_or_else(|| SystemClock.now())
}

/// Restores the consumer's window and moves it onto today's horizon, so a
/// session kept open across midnight never serves expired days.
fn current_paginator(
    config: &AppConfig,
    state: WindowState,
    now: Option<NaiveDateTime>,
) -> Result<WeekPaginator, AppError> {
    let mut paginator = WeekPaginator::restore(state, &config.scheduling)?;
    paginator.rebase(CalendarDay::of(resolve_now(now)));
    Ok(paginator)
}

#[axum::debug_handler]
pub async fn get_horizon(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<HorizonQuery>,
) -> Result<Json<Value>, AppError> {
    let today = query
        .today
        .map(CalendarDay::from)
        .unwrap_or_else(|| CalendarDay::of(SystemClock.now()));

    let horizon = HorizonService::new(&state.scheduling).build_horizon(today);

    Ok(Json(json!({
        "min_date": horizon.min_date(),
        "max_date": horizon.max_date(),
        "days": horizon.days(),
    })))
}

#[axum::debug_handler]
pub async fn get_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let now = resolve_now(query.now);
    let day = CalendarDay::from(query.date);

    // Only days a patient could have navigated to are served.
    let mut paginator = WeekPaginator::from_config(CalendarDay::of(now), &state.scheduling);
    paginator.select_day(day)?;

    let source = SupabaseAppointmentSource::new(&state);
    let booked_times = source
        .booked_times(&doctor_id, day.date())
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let grid = SlotGridService::new(&state.scheduling).build_slot_grid(day, &booked_times, now);
    debug!("Serving {} slots for doctor {} on {}", grid.len(), doctor_id, day);

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "day": grid.day,
        "slots": grid.slots,
        "available_count": grid.available().count(),
    })))
}

#[axum::debug_handler]
pub async fn get_queue(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<NowQuery>,
) -> Result<Json<Value>, AppError> {
    let now = resolve_now(query.now);

    let source = SupabaseAppointmentSource::new(&state);
    let appointments = source
        .approved_appointments(&doctor_id, now.date())
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let classification = QueueClassifier::new(&state.scheduling).classify(&appointments, now);

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "now": now,
        "classification": classification,
    })))
}

#[axum::debug_handler]
pub async fn select_day(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<NowQuery>,
    Json(request): Json<SelectDayRequest>,
) -> Result<Json<WindowResponse>, AppError> {
    let mut paginator = current_paginator(&state, request.state, query.now)?;
    paginator.select_day(request.day)?;

    Ok(Json(WindowResponse::from_paginator(&paginator, None)))
}

#[axum::debug_handler]
pub async fn select_day_at_index(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<NowQuery>,
    Json(request): Json<SelectIndexRequest>,
) -> Result<Json<WindowResponse>, AppError> {
    let mut paginator = current_paginator(&state, request.state, query.now)?;
    paginator.select_day_at_index(request.index)?;

    Ok(Json(WindowResponse::from_paginator(&paginator, None)))
}

#[axum::debug_handler]
pub async fn page_forward(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<NowQuery>,
    Json(request): Json<PageRequest>,
) -> Result<Json<WindowResponse>, AppError> {
    let mut paginator = current_paginator(&state, request.state, query.now)?;
    let outcome = paginator.page_forward();

    Ok(Json(WindowResponse::from_paginator(&paginator, Some(outcome))))
}

#[axum::debug_handler]
pub async fn page_backward(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<NowQuery>,
    Json(request): Json<PageRequest>,
) -> Result<Json<WindowResponse>, AppError> {
    let mut paginator = current_paginator(&state, request.state, query.now)?;
    let outcome = paginator.page_backward();

    Ok(Json(WindowResponse::from_paginator(&paginator, Some(outcome))))
}
