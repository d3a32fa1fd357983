//! 请求处理器
//!
//! 所有响应使用统一信封 {success, message, data}

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, TokenKind};
use crate::beds::{self, BedStatusUpdate, HospitalWithStatus};
use crate::error::ApiError;
use crate::storage::NewBedRequest;

use super::AppState;

/// 成功响应信封
fn envelope(message: &str, data: Value) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data,
    }))
}

/// JSON 请求体解析失败统一按 400 处理
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(format!("序列化响应失败: {}", e)))
}

// 健康检查

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "message": "bedboard is healthy" })),
    )
}

// 医院目录

/// GET /api/v1/hospitals - 全部医院（按名称排序），附总床位档位
pub async fn list_hospitals(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let hospitals = state.storage.list_hospitals_by_name().await?;
    let hospitals: Vec<HospitalWithStatus> =
        hospitals.into_iter().map(HospitalWithStatus::new).collect();

    Ok(envelope(
        "Hospitals retrieved successfully",
        json!({
            "count": hospitals.len(),
            "hospitals": to_value(&hospitals)?,
        }),
    ))
}

/// GET /api/v1/hospitals/:id - 单个医院详情（含医生、科室、服务、图片）
pub async fn hospital_details(
    State(state): State<AppState>,
    Path(hospital_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if hospital_id <= 0 {
        return Err(ApiError::Validation("Invalid hospital ID".to_string()));
    }

    let hospital = state
        .storage
        .get_hospital(hospital_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Hospital not found".to_string()))?;

    let mut data = to_value(&HospitalWithStatus::new(hospital))?;
    data["doctors"] = to_value(&state.storage.doctors_of(hospital_id).await?)?;
    data["departments"] = to_value(&state.storage.departments_of(hospital_id).await?)?;
    data["services"] = to_value(&state.storage.services_of(hospital_id).await?)?;
    data["images"] = to_value(&state.storage.images_of(hospital_id).await?)?;

    Ok(envelope("Hospital details retrieved successfully", data))
}

// 床位状态

/// GET /api/v1/beds/status - 全部医院分级 + 全局概览
pub async fn bed_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let hospitals = state.storage.list_hospitals_by_region().await?;
    let report = beds::aggregate(hospitals);

    Ok(envelope(
        "Bed status retrieved successfully",
        json!({
            "summary": to_value(&report.summary)?,
            "hospitals": to_value(&report.hospitals)?,
            "last_updated": Utc::now(),
        }),
    ))
}

/// POST /api/v1/beds/status - 工作人员更新床位可用数
pub async fn update_bed_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<BedStatusUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let claims = auth::require_staff(&headers, &state.tokens)?;
    let update = json_body(payload)?;

    tracing::debug!(
        "工作人员 {} 提交床位更新: 医院 {}",
        claims.name,
        update.hospital_id
    );

    let outcome = beds::update::apply(&state.storage, &update).await?;

    Ok(envelope(
        "Bed status updated successfully",
        to_value(&outcome)?,
    ))
}

// 床位申请

#[derive(Debug, Deserialize)]
pub struct BedRequestPayload {
    pub hospital_id: i64,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub bed_type: String,
    pub urgency_level: String,
    #[serde(default)]
    pub reason: String,
}

const BED_TYPES: [&str; 3] = ["general", "icu", "emergency"];
const URGENCY_LEVELS: [&str; 4] = ["low", "medium", "high", "critical"];

/// POST /api/v1/beds/requests - 患者提交床位申请
pub async fn create_bed_request(
    State(state): State<AppState>,
    payload: Result<Json<BedRequestPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = json_body(payload)?;

    let patient_name = payload.patient_name.trim();
    let patient_email = payload.patient_email.trim();
    let patient_phone = payload.patient_phone.trim();

    if payload.hospital_id <= 0
        || patient_name.is_empty()
        || patient_email.is_empty()
        || patient_phone.is_empty()
        || payload.bed_type.is_empty()
        || payload.urgency_level.is_empty()
    {
        return Err(ApiError::Validation(
            "All required fields must be filled".to_string(),
        ));
    }

    if !auth::is_valid_email(patient_email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }

    if !BED_TYPES.contains(&payload.bed_type.as_str()) {
        return Err(ApiError::Validation("Invalid bed type".to_string()));
    }

    if !URGENCY_LEVELS.contains(&payload.urgency_level.as_str()) {
        return Err(ApiError::Validation("Invalid urgency level".to_string()));
    }

    if !state.storage.hospital_exists(payload.hospital_id).await? {
        return Err(ApiError::NotFound("Hospital not found".to_string()));
    }

    let request_id = state
        .storage
        .insert_bed_request(&NewBedRequest {
            hospital_id: payload.hospital_id,
            patient_name: patient_name.to_string(),
            patient_email: patient_email.to_string(),
            patient_phone: patient_phone.to_string(),
            bed_type: payload.bed_type,
            urgency_level: payload.urgency_level,
            reason: payload.reason.trim().to_string(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        envelope(
            "Bed request submitted successfully. Hospital staff will contact you soon.",
            json!({ "request_id": request_id }),
        ),
    ))
}

// 图片

/// GET /api/v1/images/hero - 首页轮播图
pub async fn hero_images(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let images = state.storage.hero_images().await?;

    Ok(envelope(
        "Hero images retrieved successfully",
        json!({
            "count": images.len(),
            "images": to_value(&images)?,
        }),
    ))
}

// 认证

#[derive(Debug, Deserialize)]
pub struct StaffLoginPayload {
    pub username: String,
    pub password: String,
}

/// POST /api/v1/auth/staff/login - 工作人员登录，返回签名令牌
///
/// 用户名不存在与密码错误返回同一提示，不泄露账号是否存在
pub async fn staff_login(
    State(state): State<AppState>,
    payload: Result<Json<StaffLoginPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let payload = json_body(payload)?;

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let user = state
        .storage
        .find_staff_by_username(payload.username.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    state.storage.touch_staff_login(user.user_id).await?;

    let token = state.tokens.issue_staff(
        user.user_id,
        &user.username,
        &user.email,
        user.hospital_id,
        &user.role,
    )?;

    tracing::info!("工作人员登录成功: {}", user.username);

    Ok(envelope(
        "Login successful",
        json!({
            "user_id": user.user_id,
            "username": user.username,
            "role": user.role,
            "hospital_id": user.hospital_id,
            "token": token,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct PatientRegisterPayload {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

/// POST /api/v1/auth/patients/register - 患者注册
pub async fn patient_register(
    State(state): State<AppState>,
    payload: Result<Json<PatientRegisterPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = json_body(payload)?;

    let full_name = payload.full_name.trim();
    let email = payload.email.trim();
    let phone = payload.phone.trim();

    if full_name.is_empty() || email.is_empty() || phone.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("All fields are required".to_string()));
    }

    if !auth::is_valid_email(email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }

    if payload.password != payload.confirm_password {
        return Err(ApiError::Validation("Passwords do not match".to_string()));
    }

    if state.storage.patient_email_exists(email).await? {
        return Err(ApiError::Validation("Email already registered".to_string()));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let patient_id = state
        .storage
        .insert_patient(full_name, email, phone, &password_hash)
        .await?;

    tracing::info!("患者注册成功: {}", patient_id);

    Ok((
        StatusCode::CREATED,
        envelope(
            "Account created successfully! You can now sign in.",
            json!({ "patient_id": patient_id }),
        ),
    ))
}

#[derive(Debug, Deserialize)]
pub struct PatientLoginPayload {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/patients/login - 患者登录，返回签名令牌
pub async fn patient_login(
    State(state): State<AppState>,
    payload: Result<Json<PatientLoginPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let payload = json_body(payload)?;

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let patient = state
        .storage
        .find_active_patient_by_email(payload.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !auth::verify_password(&payload.password, &patient.password_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    state.storage.touch_patient_login(patient.patient_id).await?;

    let token = state
        .tokens
        .issue_patient(patient.patient_id, &patient.full_name, &patient.email)?;

    Ok(envelope(
        "Login successful!",
        json!({
            "patient_id": patient.patient_id,
            "patient_name": patient.full_name,
            "patient_email": patient.email,
            "token": token,
        }),
    ))
}

/// GET /api/v1/auth/session - 由可选的患者令牌还原登录状态
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let claims = auth::bearer_token(&headers).and_then(|token| state.tokens.verify(token).ok());

    let data = match claims {
        Some(claims) if claims.kind == TokenKind::Patient => json!({
            "logged_in": true,
            "patient_name": claims.name,
            "patient_email": claims.email,
        }),
        _ => json!({
            "logged_in": false,
            "patient_name": null,
            "patient_email": null,
        }),
    };

    Ok(envelope("Session state", data))
}
