//! 存储层数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 医院记录
///
/// 不变式：available_beds <= total_beds，各分类同理；
/// general_available 为派生值（总可用 - ICU 可用 - 急诊可用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Hospital {
    pub hospital_id: i64,
    pub name: String,
    pub address: String,
    pub region: String,
    pub phone: String,
    pub email: String,
    pub logo_url: Option<String>,
    pub total_beds: i64,
    pub available_beds: i64,
    pub icu_beds: i64,
    pub icu_available: i64,
    pub emergency_beds: i64,
    pub emergency_available: i64,
    pub general_beds: i64,
    pub general_available: i64,
    pub updated_at: DateTime<Utc>,
}

/// 医院三个床位池的容量（校验更新请求时读取，不信任客户端）
#[derive(Debug, Clone, Copy, FromRow)]
pub struct BedCapacity {
    pub total_beds: i64,
    pub icu_beds: i64,
    pub emergency_beds: i64,
}

/// 床位更新审计日志条目：成功更新时写入一条，之后不再变动
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BedStatusLogEntry {
    pub log_id: i64,
    pub hospital_id: i64,
    pub total_beds: i64,
    pub available_beds: i64,
    pub icu_beds: i64,
    pub icu_available: i64,
    pub emergency_beds: i64,
    pub emergency_available: i64,
    pub logged_at: DateTime<Utc>,
}

/// 医院工作人员账号
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StaffUser {
    pub user_id: i64,
    pub hospital_id: Option<i64>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

/// 患者账号
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Patient {
    pub patient_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 患者床位申请
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BedRequest {
    pub request_id: i64,
    pub hospital_id: i64,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub bed_type: String,
    pub urgency_level: String,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// 医生
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Doctor {
    pub doctor_id: i64,
    pub hospital_id: i64,
    pub name: String,
    pub specialty: String,
    pub phone: String,
}

/// 科室
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Department {
    pub department_id: i64,
    pub hospital_id: i64,
    pub name: String,
    pub description: String,
}

/// 医疗服务
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Service {
    pub service_id: i64,
    pub hospital_id: i64,
    pub service_name: String,
    pub description: String,
}

/// 医院图片（type 为 hero 的用于首页轮播）
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HospitalImage {
    pub image_id: i64,
    pub hospital_id: Option<i64>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub image_type: String,
    pub image_url: String,
    pub caption: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
}
