//! 床位更新
//!
//! 校验工作人员提交的可用数，派生普通床位可用数，
//! 在同一事务内写入医院记录并追加一条审计日志

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::classify;
use crate::error::ApiError;
use crate::storage::{self, models::BedCapacity, Storage};

/// 工作人员提交的床位更新请求
#[derive(Debug, Clone, Deserialize)]
pub struct BedStatusUpdate {
    pub hospital_id: i64,
    pub available_beds: i64,
    pub icu_available: i64,
    pub emergency_available: i64,
}

/// 更新成功的结果
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub hospital_id: i64,
    pub general_available: i64,
    pub updated_at: DateTime<Utc>,
}

/// 按存储中的容量校验更新请求，返回派生的普通床位可用数
///
/// 容量一律以医院记录为准，不信任客户端提交的数值
pub fn validate(capacity: &BedCapacity, update: &BedStatusUpdate) -> Result<i64, ApiError> {
    if update.available_beds < 0 || update.icu_available < 0 || update.emergency_available < 0 {
        return Err(ApiError::Validation(
            "Bed counts cannot be negative".to_string(),
        ));
    }

    if update.available_beds > capacity.total_beds
        || update.icu_available > capacity.icu_beds
        || update.emergency_available > capacity.emergency_beds
    {
        return Err(ApiError::Validation(
            "Available beds cannot exceed total beds".to_string(),
        ));
    }

    let general_available =
        update.available_beds - update.icu_available - update.emergency_available;
    // ICU + 急诊可用数之和超过总可用数时派生值为负，视为输入不一致
    if general_available < 0 {
        return Err(ApiError::Validation(
            "ICU and emergency beds cannot exceed total available beds".to_string(),
        ));
    }

    Ok(general_available)
}

/// 执行一次床位更新
///
/// 读容量、校验、写计数、追加日志全部在同一事务内，
/// 并发更新同一医院时不会交错读到过期容量或丢失对方的写入
pub async fn apply(storage: &Storage, update: &BedStatusUpdate) -> Result<UpdateOutcome, ApiError> {
    let mut tx = storage.begin().await?;

    let capacity = storage::bed_capacity(&mut tx, update.hospital_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Hospital not found".to_string()))?;

    let general_available = validate(&capacity, update)?;

    let now = Utc::now();
    storage::write_bed_counts(
        &mut tx,
        update.hospital_id,
        update.available_beds,
        update.icu_available,
        update.emergency_available,
        general_available,
        now,
    )
    .await?;

    storage::append_bed_status_log(
        &mut tx,
        update.hospital_id,
        &capacity,
        update.available_beds,
        update.icu_available,
        update.emergency_available,
        now,
    )
    .await?;

    tx.commit().await?;

    let overall = classify(update.available_beds, capacity.total_beds);
    tracing::info!(
        "床位状态已更新: 医院 {} 可用 {}/{} ({})",
        update.hospital_id,
        update.available_beds,
        capacity.total_beds,
        overall.status
    );

    Ok(UpdateOutcome {
        hospital_id: update.hospital_id,
        general_available,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity() -> BedCapacity {
        BedCapacity {
            total_beds: 100,
            icu_beds: 20,
            emergency_beds: 30,
        }
    }

    fn update(available: i64, icu: i64, emergency: i64) -> BedStatusUpdate {
        BedStatusUpdate {
            hospital_id: 1,
            available_beds: available,
            icu_available: icu,
            emergency_available: emergency,
        }
    }

    #[test]
    fn test_validate_derives_general_available() {
        let general = validate(&capacity(), &update(50, 10, 15)).unwrap();
        assert_eq!(general, 25);
    }

    #[test]
    fn test_validate_rejects_over_capacity() {
        // 总可用超过总床位
        let err = validate(&capacity(), &update(150, 10, 15)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // ICU 可用超过 ICU 容量
        let err = validate(&capacity(), &update(50, 21, 15)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // 急诊可用超过急诊容量
        let err = validate(&capacity(), &update(50, 10, 31)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_negative_inputs() {
        let err = validate(&capacity(), &update(-1, 0, 0)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_negative_general() {
        // 10 - 10 - 15 = -15
        let err = validate(&capacity(), &update(10, 10, 15)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_validate_allows_boundary_values() {
        // 恰好等于容量
        let general = validate(&capacity(), &update(100, 20, 30)).unwrap();
        assert_eq!(general, 50);

        // 全部清零
        let general = validate(&capacity(), &update(0, 0, 0)).unwrap();
        assert_eq!(general, 0);
    }
}
