//! # API REST
//!
//! REST API implementation for Agapay.
//!
//! Handles:
//! - HTTP endpoints with axum, one group per screen (intake, companion, dashboard)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for request and response bodies.
//!
//! Each intake session, the companion and the dashboard sit behind their own async mutex. Model
//! calls are made with that mutex released: the handler marks the controller busy, drops the
//! lock, and hands the gateway call plus the re-lock that stores its result to a spawned task.
//! A second request arriving in between sees the busy flag and gets `409 Conflict`. The task
//! runs to completion even if the client disconnects, so the busy flag is always cleared.

#![warn(rust_2018_idioms)]

use agapay_core::companion::{CitizenCompanion, SentinelSymptom};
use agapay_core::dashboard::{AdminDashboard, DashboardData};
use agapay_core::history::PatientHistory;
use agapay_core::intake::IntakeFlow;
use agapay_core::{AgapayError, AgapayResult, CoreConfig};
use agapay_gateway::AgapayAssistant;
use agapay_types::{Demographics, Vitals};
use api_shared::companion::{
    ChatReq, ChatRes, ChatTurnRes, MedicationRes, MedicationsRes, SymptomReportReq,
    SymptomReportRes,
};
use api_shared::dashboard::{
    ChartSeriesRes, ChartViewRes, DashboardRes, InventoryRes, ReportRes, TelehealthCaseRes,
    TrendPointRes,
};
use api_shared::intake::{
    ExamFindingReq, IntakeSessionRes, PatientHistoryRes, ReferralRes, SymptomsReq,
};
use api_shared::{HealthRes, HealthService};
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use tokio::task::JoinError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

type ApiError = (StatusCode, &'static str);
type SharedFlow = Arc<Mutex<IntakeFlow>>;

/// Application state for the REST API server
///
/// Shared by every handler. Cloning is cheap; all mutable state is behind `Arc<Mutex<_>>`.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    assistant: AgapayAssistant,
    history: PatientHistory,
    sessions: Arc<Mutex<HashMap<Uuid, SharedFlow>>>,
    companion: Arc<Mutex<CitizenCompanion>>,
    dashboard: Arc<Mutex<AdminDashboard>>,
}

impl AppState {
    /// Build the state with a freshly seeded companion and dashboard.
    ///
    /// # Errors
    ///
    /// Returns `AgapayError::YamlDeserialization` if a bundled fixture is malformed.
    pub fn new(
        cfg: Arc<CoreConfig>,
        assistant: AgapayAssistant,
        history: PatientHistory,
    ) -> AgapayResult<Self> {
        let companion = CitizenCompanion::seeded(cfg.barangay())?;
        let dashboard = AdminDashboard::new(DashboardData::mock()?);
        Ok(Self {
            cfg,
            assistant,
            history,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            companion: Arc::new(Mutex::new(companion)),
            dashboard: Arc::new(Mutex::new(dashboard)),
        })
    }

    async fn session(&self, id: Uuid) -> Result<SharedFlow, ApiError> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or((StatusCode::NOT_FOUND, "Session not found"))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_session,
        get_session,
        delete_session,
        update_demographics,
        update_vitals,
        update_symptoms,
        assess,
        mark_exam_finding,
        back_to_intake,
        create_referral,
        start_new_intake,
        patient_history,
        list_medications,
        take_medication,
        report_symptom,
        get_chat,
        send_chat,
        get_dashboard,
        generate_report,
        dismiss_report,
    ),
    components(schemas(
        HealthRes,
        Demographics,
        Vitals,
        agapay_types::Gender,
        agapay_types::RiskLevel,
        agapay_types::ExamFinding,
        agapay_types::PhysicalExamCheck,
        agapay_types::ClinicalAssessment,
        agapay_types::PatientRecord,
        agapay_types::RecordId,
        agapay_types::ReferralPayload,
        SymptomsReq,
        ExamFindingReq,
        ReferralRes,
        IntakeSessionRes,
        PatientHistoryRes,
        MedicationRes,
        MedicationsRes,
        SymptomReportReq,
        SymptomReportRes,
        ChatReq,
        ChatTurnRes,
        ChatRes,
        InventoryRes,
        TrendPointRes,
        TelehealthCaseRes,
        ChartSeriesRes,
        ChartViewRes,
        DashboardRes,
        ReportRes,
    ))
)]
pub struct ApiDoc;

/// Build the full router, including Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/intake/sessions", post(create_session))
        .route(
            "/intake/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/intake/sessions/:id/demographics", put(update_demographics))
        .route("/intake/sessions/:id/vitals", put(update_vitals))
        .route("/intake/sessions/:id/symptoms", put(update_symptoms))
        .route("/intake/sessions/:id/assess", post(assess))
        .route("/intake/sessions/:id/exam/:check_id", post(mark_exam_finding))
        .route("/intake/sessions/:id/back", post(back_to_intake))
        .route("/intake/sessions/:id/referral", post(create_referral))
        .route("/intake/sessions/:id/reset", post(start_new_intake))
        .route("/patients/:name/history", get(patient_history))
        .route("/companion/medications", get(list_medications))
        .route("/companion/medications/:id/take", post(take_medication))
        .route("/companion/reports", post(report_symptom))
        .route("/companion/chat", get(get_chat).post(send_chat))
        .route("/dashboard", get(get_dashboard))
        .route(
            "/dashboard/report",
            post(generate_report).delete(dismiss_report),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map a core error onto a status code. Server-side failures are logged.
fn core_error(context: &'static str, e: AgapayError) -> ApiError {
    match e {
        AgapayError::InvalidInput(_) | AgapayError::Types(_) => {
            tracing::debug!("{} rejected: {}", context, e);
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        AgapayError::InvalidTransition { .. } => {
            tracing::debug!("{} rejected: {}", context, e);
            (StatusCode::CONFLICT, "Not allowed in the current step")
        }
        AgapayError::Busy(_) => (StatusCode::CONFLICT, "Request already in progress"),
        AgapayError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
        _ => {
            tracing::error!("{} error: {:?}", context, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// A spawned gateway task panicked or was cancelled.
fn task_error(context: &'static str, e: JoinError) -> ApiError {
    tracing::error!("{} task failed: {}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}

fn render(id: Uuid, flow: &IntakeFlow) -> Result<Json<IntakeSessionRes>, ApiError> {
    IntakeSessionRes::from_flow(id.to_string(), flow)
        .map(Json)
        .map_err(|e| {
            tracing::error!("Render session error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness check. Does not contact the model.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/intake/sessions",
    responses(
        (status = 201, description = "Blank intake session", body = IntakeSessionRes)
    )
)]
/// Start a blank intake form for the configured barangay.
#[axum::debug_handler]
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<IntakeSessionRes>), ApiError> {
    let id = Uuid::new_v4();
    let flow = IntakeFlow::new(state.history.clone(), state.cfg.barangay());
    let body = render(id, &flow)?;
    state
        .sessions
        .lock()
        .await
        .insert(id, Arc::new(Mutex::new(flow)));
    tracing::info!("intake session {} started", id);
    Ok((StatusCode::CREATED, body))
}

#[utoipa::path(
    get,
    path = "/intake/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session state", body = IntakeSessionRes),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn get_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let flow = flow.lock().await;
    render(id, &flow)
}

#[utoipa::path(
    delete,
    path = "/intake/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session discarded; stored records are kept"),
        (status = 404, description = "Session not found")
    )
)]
/// Discard an intake session. An assessment already in flight still completes on the dropped flow.
#[axum::debug_handler]
async fn delete_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .lock()
        .await
        .remove(&id)
        .ok_or((StatusCode::NOT_FOUND, "Session not found"))?;
    tracing::info!("intake session {} closed", id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/intake/sessions/{id}/demographics",
    params(("id" = String, Path, description = "Session id")),
    request_body = Demographics,
    responses(
        (status = 200, description = "Demographics updated; history reloaded on name change", body = IntakeSessionRes),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Not in the intake step, or an assessment is in flight")
    )
)]
#[axum::debug_handler]
async fn update_demographics(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<Demographics>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let mut flow = flow.lock().await;
    flow.set_demographics(req)
        .map_err(|e| core_error("Update demographics", e))?;
    render(id, &flow)
}

#[utoipa::path(
    put,
    path = "/intake/sessions/{id}/vitals",
    params(("id" = String, Path, description = "Session id")),
    request_body = Vitals,
    responses(
        (status = 200, description = "Vitals updated", body = IntakeSessionRes),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Not in the intake step, or an assessment is in flight")
    )
)]
#[axum::debug_handler]
async fn update_vitals(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<Vitals>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let mut flow = flow.lock().await;
    flow.set_vitals(req)
        .map_err(|e| core_error("Update vitals", e))?;
    render(id, &flow)
}

#[utoipa::path(
    put,
    path = "/intake/sessions/{id}/symptoms",
    params(("id" = String, Path, description = "Session id")),
    request_body = SymptomsReq,
    responses(
        (status = 200, description = "Symptoms updated", body = IntakeSessionRes),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Not in the intake step, or an assessment is in flight")
    )
)]
#[axum::debug_handler]
async fn update_symptoms(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<SymptomsReq>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let mut flow = flow.lock().await;
    flow.set_symptoms(req.text)
        .map_err(|e| core_error("Update symptoms", e))?;
    render(id, &flow)
}

#[utoipa::path(
    post,
    path = "/intake/sessions/{id}/assess",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Assessment generated (possibly the fallback)", body = IntakeSessionRes),
        (status = 400, description = "Symptom field is empty"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Not in the intake step, or an assessment is already in flight")
    )
)]
/// Generate a triage assessment.
///
/// Gateway failures are not errors here: the session moves to the assessment step with the
/// fallback assessment.
#[axum::debug_handler]
async fn assess(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let request = flow
        .lock()
        .await
        .begin_assessment()
        .map_err(|e| core_error("Begin assessment", e))?;

    let assistant = state.assistant.clone();
    let task_flow = flow.clone();
    let task = tokio::spawn(async move {
        let assessment = assistant
            .assess_patient_condition(
                &request.symptoms,
                &request.vitals,
                request.age,
                request.gender,
            )
            .await;
        let mut flow = task_flow.lock().await;
        flow.complete_assessment(assessment)
    });

    match task.await {
        Ok(result) => result.map_err(|e| core_error("Complete assessment", e))?,
        Err(e) => {
            flow.lock().await.abort_assessment();
            return Err(task_error("Assessment", e));
        }
    }

    let flow = flow.lock().await;
    render(id, &flow)
}

#[utoipa::path(
    post,
    path = "/intake/sessions/{id}/exam/{check_id}",
    params(
        ("id" = String, Path, description = "Session id"),
        ("check_id" = String, Path, description = "Physical exam check id")
    ),
    request_body = ExamFindingReq,
    responses(
        (status = 200, description = "Finding recorded on the session only", body = IntakeSessionRes),
        (status = 404, description = "Session or check not found"),
        (status = 409, description = "Not in the assessment step")
    )
)]
#[axum::debug_handler]
async fn mark_exam_finding(
    State(state): State<AppState>,
    AxumPath((id, check_id)): AxumPath<(Uuid, String)>,
    Json(req): Json<ExamFindingReq>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let mut flow = flow.lock().await;
    flow.mark_exam_finding(&check_id, req.finding)
        .map_err(|e| core_error("Mark exam finding", e))?;
    render(id, &flow)
}

#[utoipa::path(
    post,
    path = "/intake/sessions/{id}/back",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Back in the intake step; assessment discarded", body = IntakeSessionRes),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Not in the assessment step")
    )
)]
#[axum::debug_handler]
async fn back_to_intake(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let mut flow = flow.lock().await;
    flow.back_to_intake()
        .map_err(|e| core_error("Back to intake", e))?;
    render(id, &flow)
}

#[utoipa::path(
    post,
    path = "/intake/sessions/{id}/referral",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Record stored and referral rendered", body = IntakeSessionRes),
        (status = 400, description = "Patient name is missing"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Not in the assessment step"),
        (status = 500, description = "Internal server error")
    )
)]
#[axum::debug_handler]
async fn create_referral(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let mut flow = flow.lock().await;
    flow.create_referral()
        .map_err(|e| core_error("Create referral", e))?;
    render(id, &flow)
}

#[utoipa::path(
    post,
    path = "/intake/sessions/{id}/reset",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "New intake for the same patient", body = IntakeSessionRes),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Not in the referral step")
    )
)]
#[axum::debug_handler]
async fn start_new_intake(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<IntakeSessionRes>, ApiError> {
    let flow = state.session(id).await?;
    let mut flow = flow.lock().await;
    flow.start_new_intake()
        .map_err(|e| core_error("Start new intake", e))?;
    render(id, &flow)
}

#[utoipa::path(
    get,
    path = "/patients/{name}/history",
    params(("name" = String, Path, description = "Patient name; case and padding are ignored")),
    responses(
        (status = 200, description = "Stored records, newest first", body = PatientHistoryRes)
    )
)]
#[axum::debug_handler]
async fn patient_history(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Json<PatientHistoryRes> {
    let records = state.history.load(&name);
    Json(PatientHistoryRes::new(&name, records))
}

#[utoipa::path(
    get,
    path = "/companion/medications",
    responses(
        (status = 200, description = "Today's schedule", body = MedicationsRes)
    )
)]
#[axum::debug_handler]
async fn list_medications(State(state): State<AppState>) -> Json<MedicationsRes> {
    let companion = state.companion.lock().await;
    Json(MedicationsRes::from(&*companion))
}

#[utoipa::path(
    post,
    path = "/companion/medications/{id}/take",
    params(("id" = String, Path, description = "Medication id")),
    responses(
        (status = 200, description = "Dose recorded", body = MedicationsRes),
        (status = 400, description = "Already taken today or none left"),
        (status = 404, description = "Medication not found")
    )
)]
#[axum::debug_handler]
async fn take_medication(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<MedicationsRes>, ApiError> {
    let mut companion = state.companion.lock().await;
    companion
        .medications
        .take(&id)
        .map_err(|e| core_error("Take medication", e))?;
    Ok(Json(MedicationsRes::from(&*companion)))
}

#[utoipa::path(
    post,
    path = "/companion/reports",
    request_body = SymptomReportReq,
    responses(
        (status = 200, description = "Report acknowledged locally", body = SymptomReportRes),
        (status = 400, description = "Unknown symptom")
    )
)]
#[axum::debug_handler]
async fn report_symptom(
    State(state): State<AppState>,
    Json(req): Json<SymptomReportReq>,
) -> Result<Json<SymptomReportRes>, ApiError> {
    let symptom: SentinelSymptom = req
        .symptom
        .parse()
        .map_err(|e| core_error("Report symptom", e))?;
    let mut companion = state.companion.lock().await;
    let acknowledgment = companion.reports.report(symptom);
    Ok(Json(SymptomReportRes::new(
        acknowledgment,
        companion.reports.reports(),
    )))
}

#[utoipa::path(
    get,
    path = "/companion/chat",
    responses(
        (status = 200, description = "Chat transcript", body = ChatRes)
    )
)]
#[axum::debug_handler]
async fn get_chat(State(state): State<AppState>) -> Json<ChatRes> {
    let companion = state.companion.lock().await;
    Json(ChatRes::from(&companion.chat))
}

#[utoipa::path(
    post,
    path = "/companion/chat",
    request_body = ChatReq,
    responses(
        (status = 200, description = "Transcript with the reply appended", body = ChatRes),
        (status = 400, description = "Empty message"),
        (status = 409, description = "A reply is already pending")
    )
)]
#[axum::debug_handler]
async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatReq>,
) -> Result<Json<ChatRes>, ApiError> {
    let pending = state
        .companion
        .lock()
        .await
        .chat
        .begin_send(&req.message)
        .map_err(|e| core_error("Send chat", e))?;

    let assistant = state.assistant.clone();
    let companion = state.companion.clone();
    let task = tokio::spawn(async move {
        let reply = assistant.chat(&pending.message, &pending.history).await;
        let mut companion = companion.lock().await;
        let stored = companion.chat.complete_send(reply).map(|_| ());
        stored
    });
    task.await
        .map_err(|e| task_error("Chat", e))?
        .map_err(|e| core_error("Complete chat", e))?;

    let companion = state.companion.lock().await;
    Ok(Json(ChatRes::from(&companion.chat)))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Mock datasets, charts and telehealth queue", body = DashboardRes)
    )
)]
#[axum::debug_handler]
async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardRes> {
    let dashboard = state.dashboard.lock().await;
    Json(DashboardRes::from(&*dashboard))
}

#[utoipa::path(
    post,
    path = "/dashboard/report",
    responses(
        (status = 200, description = "Logistics report (possibly the fallback text)", body = ReportRes),
        (status = 409, description = "A report is already being generated")
    )
)]
#[axum::debug_handler]
async fn generate_report(State(state): State<AppState>) -> Result<Json<ReportRes>, ApiError> {
    let (inventory, trend) = state
        .dashboard
        .lock()
        .await
        .begin_report()
        .map_err(|e| core_error("Begin report", e))?;

    let assistant = state.assistant.clone();
    let dashboard = state.dashboard.clone();
    let task = tokio::spawn(async move {
        let text = assistant.logistics_intel(&inventory, &trend).await;
        let mut dashboard = dashboard.lock().await;
        let report = dashboard.complete_report(text).map(str::to_string);
        report
    });
    let report = task
        .await
        .map_err(|e| task_error("Logistics report", e))?
        .map_err(|e| core_error("Complete report", e))?;
    Ok(Json(ReportRes { report }))
}

#[utoipa::path(
    delete,
    path = "/dashboard/report",
    responses(
        (status = 204, description = "Report panel dismissed")
    )
)]
#[axum::debug_handler]
async fn dismiss_report(State(state): State<AppState>) -> StatusCode {
    state.dashboard.lock().await.dismiss_report();
    StatusCode::NO_CONTENT
}
