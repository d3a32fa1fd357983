//! 认证模块
//!
//! argon2 密码哈希 + 无状态签名令牌（取代原有的服务端会话）；
//! 核心床位逻辑不关心调用方如何通过认证

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("邮箱正则不合法"));

/// 邮箱格式是否合法
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 生成密码哈希（argon2，随机盐）
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("密码哈希失败: {}", e)))
}

/// 校验密码；哈希格式不合法按不匹配处理
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// 令牌主体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Staff,
    Patient,
}

/// 签名令牌载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 账号 ID
    pub sub: i64,
    pub kind: TokenKind,
    pub name: String,
    pub email: String,
    /// 工作人员所属医院
    pub hospital_id: Option<i64>,
    pub role: Option<String>,
    /// 过期时间（Unix 秒）
    pub exp: i64,
}

/// 令牌签发与校验
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl_hours: i64,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }

    /// 签发工作人员令牌
    pub fn issue_staff(
        &self,
        user_id: i64,
        username: &str,
        email: &str,
        hospital_id: Option<i64>,
        role: &str,
    ) -> Result<String, ApiError> {
        self.issue(Claims {
            sub: user_id,
            kind: TokenKind::Staff,
            name: username.to_string(),
            email: email.to_string(),
            hospital_id,
            role: Some(role.to_string()),
            exp: 0,
        })
    }

    /// 签发患者令牌
    pub fn issue_patient(
        &self,
        patient_id: i64,
        full_name: &str,
        email: &str,
    ) -> Result<String, ApiError> {
        self.issue(Claims {
            sub: patient_id,
            kind: TokenKind::Patient,
            name: full_name.to_string(),
            email: email.to_string(),
            hospital_id: None,
            role: None,
            exp: 0,
        })
    }

    fn issue(&self, mut claims: Claims) -> Result<String, ApiError> {
        claims.exp = (Utc::now() + Duration::hours(self.ttl_hours)).timestamp();
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("令牌签发失败: {}", e)))
    }

    /// 校验令牌并返回载荷；过期或签名不符均视为未认证
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))
    }
}

/// 从请求头中取出 Bearer 令牌
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// 要求请求携带有效的工作人员令牌
pub fn require_staff(headers: &HeaderMap, issuer: &TokenIssuer) -> Result<Claims, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
    let claims = issuer.verify(token)?;
    if claims.kind != TokenKind::Staff {
        return Err(ApiError::Unauthorized(
            "Staff credentials required".to_string(),
        ));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ward@example.com"));
        assert!(is_valid_email("a.b+c@hospital.org.cn"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_token_roundtrip() {
        let issuer = TokenIssuer::new("test-secret", 24);
        let token = issuer
            .issue_staff(7, "nurse01", "nurse01@hospital.test", Some(3), "staff")
            .unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.kind, TokenKind::Staff);
        assert_eq!(claims.hospital_id, Some(3));
        assert_eq!(claims.role.as_deref(), Some("staff"));
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let issuer = TokenIssuer::new("secret-a", 24);
        let other = TokenIssuer::new("secret-b", 24);
        let token = issuer.issue_patient(1, "张三", "a@b.cn").unwrap();
        assert!(other.verify(&token).is_err());
        assert!(issuer.verify(&token).is_ok());
    }

    #[test]
    fn test_require_staff_rejects_patient_token() {
        let issuer = TokenIssuer::new("test-secret", 24);
        let token = issuer.issue_patient(1, "张三", "a@b.cn").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );
        assert!(require_staff(&headers, &issuer).is_err());

        let empty = HeaderMap::new();
        assert!(require_staff(&empty, &issuer).is_err());
    }
}
