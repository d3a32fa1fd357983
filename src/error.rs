//! 统一错误类型
//!
//! 按 400 / 401 / 404 / 500 四类映射为 HTTP 响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 请求处理错误
///
/// 所有错误对本次请求都是终态，不做内部重试
#[derive(Debug, Error)]
pub enum ApiError {
    /// 字段缺失、格式错误、床位数超过容量
    #[error("{0}")]
    Validation(String),
    /// 认证失败或令牌无效
    #[error("{0}")]
    Unauthorized(String),
    /// 医院或其他资源不存在
    #[error("{0}")]
    NotFound(String),
    /// 底层存储失败
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    /// 其他内部错误
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // 存储细节不外泄，只记日志
            ApiError::Database(e) => {
                tracing::error!("数据库操作失败: {}", e);
                "Database error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
