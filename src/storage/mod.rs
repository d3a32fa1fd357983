//! 存储模块
//!
//! 基于 SQLite 的持久层：医院记录读写、审计日志追加、账号与床位申请

pub mod models;

use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqliteConnection, SqlitePool, Transaction,
};
use std::path::Path;
use std::str::FromStr;

use models::{
    BedCapacity, BedRequest, BedStatusLogEntry, Department, Doctor, Hospital, HospitalImage,
    Patient, Service, StaffUser,
};

/// 新建床位申请的输入
#[derive(Debug, Clone)]
pub struct NewBedRequest {
    pub hospital_id: i64,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub bed_type: String,
    pub urgency_level: String,
    pub reason: String,
}

/// 存储管理器
///
/// 进程持有一个连接池，按请求注入，不使用全局连接
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// 创建新的存储实例
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        tracing::info!("正在初始化存储层...");

        // 确保数据库目录存在
        if let Some(parent) = Path::new(database_url.trim_start_matches("sqlite:")).parent() {
            if !parent.exists() && !parent.as_os_str().is_empty() {
                tracing::debug!("创建数据库目录: {:?}", parent);
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!("正在连接数据库: {}", database_url);

        // 创建连接池，添加超时和优化配置
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| anyhow::anyhow!("数据库 URL 不合法: {}", e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .idle_timeout(std::time::Duration::from_secs(60))
            .max_lifetime(std::time::Duration::from_secs(1800))
            .connect_with(options)
            .await
            .map_err(|e| anyhow::anyhow!("无法连接到数据库: {}", e))?;

        // 设置 SQLite 优化参数
        tracing::debug!("设置 SQLite 优化参数");
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await?;

        tracing::info!("正在运行数据库迁移...");

        // 运行迁移，添加超时保护
        let migrate_result = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            sqlx::migrate!("./migrations").run(&pool),
        )
        .await;

        match migrate_result {
            Ok(Ok(_)) => {
                tracing::info!("数据库迁移完成");
            }
            Ok(Err(e)) => {
                return Err(anyhow::anyhow!("数据库迁移失败: {}", e));
            }
            Err(_) => {
                return Err(anyhow::anyhow!("数据库迁移超时（10秒）"));
            }
        }

        tracing::info!("存储层初始化完成");
        Ok(Self { pool })
    }

    /// 开启事务（校验-更新-记日志需要在同一事务内完成）
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    // 医院查询

    /// 按名称排序列出全部医院（医院目录接口）
    pub async fn list_hospitals_by_name(&self) -> Result<Vec<Hospital>, sqlx::Error> {
        let query = "SELECT * FROM hospitals ORDER BY name ASC";

        sqlx::query_as::<_, Hospital>(query)
            .fetch_all(&self.pool)
            .await
    }

    /// 按地区、名称排序列出全部医院（床位状态汇总的输入顺序）
    pub async fn list_hospitals_by_region(&self) -> Result<Vec<Hospital>, sqlx::Error> {
        let query = "SELECT * FROM hospitals ORDER BY region ASC, name ASC";

        sqlx::query_as::<_, Hospital>(query)
            .fetch_all(&self.pool)
            .await
    }

    /// 按 ID 获取医院
    pub async fn get_hospital(&self, hospital_id: i64) -> Result<Option<Hospital>, sqlx::Error> {
        let query = "SELECT * FROM hospitals WHERE hospital_id = ?1";

        sqlx::query_as::<_, Hospital>(query)
            .bind(hospital_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// 医院是否存在
    pub async fn hospital_exists(&self, hospital_id: i64) -> Result<bool, sqlx::Error> {
        let query = "SELECT hospital_id FROM hospitals WHERE hospital_id = ?1";

        let row = sqlx::query(query)
            .bind(hospital_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    // 医院详情附表

    pub async fn doctors_of(&self, hospital_id: i64) -> Result<Vec<Doctor>, sqlx::Error> {
        let query = "SELECT * FROM doctors WHERE hospital_id = ?1 ORDER BY name ASC";

        sqlx::query_as::<_, Doctor>(query)
            .bind(hospital_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn departments_of(&self, hospital_id: i64) -> Result<Vec<Department>, sqlx::Error> {
        let query = "SELECT * FROM departments WHERE hospital_id = ?1 ORDER BY name ASC";

        sqlx::query_as::<_, Department>(query)
            .bind(hospital_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn services_of(&self, hospital_id: i64) -> Result<Vec<Service>, sqlx::Error> {
        let query = "SELECT * FROM services WHERE hospital_id = ?1 ORDER BY service_name ASC";

        sqlx::query_as::<_, Service>(query)
            .bind(hospital_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn images_of(&self, hospital_id: i64) -> Result<Vec<HospitalImage>, sqlx::Error> {
        let query = r#"
            SELECT * FROM images
            WHERE hospital_id = ?1 AND is_active = 1
            ORDER BY display_order ASC, type ASC
        "#;

        sqlx::query_as::<_, HospitalImage>(query)
            .bind(hospital_id)
            .fetch_all(&self.pool)
            .await
    }

    /// 首页轮播图
    pub async fn hero_images(&self) -> Result<Vec<HospitalImage>, sqlx::Error> {
        let query = r#"
            SELECT * FROM images
            WHERE type = 'hero' AND is_active = 1
            ORDER BY display_order ASC
        "#;

        sqlx::query_as::<_, HospitalImage>(query)
            .fetch_all(&self.pool)
            .await
    }

    // 床位申请

    /// 写入一条床位申请，状态固定为 pending，返回申请 ID
    pub async fn insert_bed_request(&self, request: &NewBedRequest) -> Result<i64, sqlx::Error> {
        let query = r#"
            INSERT INTO bed_requests
            (hospital_id, patient_name, patient_email, patient_phone, bed_type, urgency_level, reason, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending')
        "#;

        let result = sqlx::query(query)
            .bind(request.hospital_id)
            .bind(&request.patient_name)
            .bind(&request.patient_email)
            .bind(&request.patient_phone)
            .bind(&request.bed_type)
            .bind(&request.urgency_level)
            .bind(&request.reason)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_bed_request(
        &self,
        request_id: i64,
    ) -> Result<Option<BedRequest>, sqlx::Error> {
        let query = "SELECT * FROM bed_requests WHERE request_id = ?1";

        sqlx::query_as::<_, BedRequest>(query)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await
    }

    // 账号

    pub async fn find_staff_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StaffUser>, sqlx::Error> {
        let query = "SELECT * FROM users WHERE username = ?1";

        sqlx::query_as::<_, StaffUser>(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn touch_staff_login(&self, user_id: i64) -> Result<(), sqlx::Error> {
        let query = "UPDATE users SET last_login = ?1 WHERE user_id = ?2";

        sqlx::query(query)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_active_patient_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Patient>, sqlx::Error> {
        let query = "SELECT * FROM patients WHERE email = ?1 AND is_active = 1";

        sqlx::query_as::<_, Patient>(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn patient_email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let query = "SELECT patient_id FROM patients WHERE email = ?1";

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// 注册患者账号，返回患者 ID
    pub async fn insert_patient(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let query = r#"
            INSERT INTO patients (full_name, email, phone, password_hash)
            VALUES (?1, ?2, ?3, ?4)
        "#;

        let result = sqlx::query(query)
            .bind(full_name)
            .bind(email)
            .bind(phone)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn touch_patient_login(&self, patient_id: i64) -> Result<(), sqlx::Error> {
        let query = "UPDATE patients SET last_login = ?1 WHERE patient_id = ?2";

        sqlx::query(query)
            .bind(Utc::now())
            .bind(patient_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // 审计日志查询

    /// 某医院最近的审计日志（新到旧）
    pub async fn bed_status_log_of(
        &self,
        hospital_id: i64,
        limit: i64,
    ) -> Result<Vec<BedStatusLogEntry>, sqlx::Error> {
        let query = r#"
            SELECT * FROM bed_status_log
            WHERE hospital_id = ?1
            ORDER BY log_id DESC
            LIMIT ?2
        "#;

        sqlx::query_as::<_, BedStatusLogEntry>(query)
            .bind(hospital_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// 获取数据库连接池（用于高级操作）
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// 事务内的床位更新原语：调用方负责 begin / commit

/// 读取医院三个床位池的容量
pub async fn bed_capacity(
    conn: &mut SqliteConnection,
    hospital_id: i64,
) -> Result<Option<BedCapacity>, sqlx::Error> {
    let query = "SELECT total_beds, icu_beds, emergency_beds FROM hospitals WHERE hospital_id = ?1";

    sqlx::query_as::<_, BedCapacity>(query)
        .bind(hospital_id)
        .fetch_optional(&mut *conn)
        .await
}

/// 写入四个可用数与更新时间
pub async fn write_bed_counts(
    conn: &mut SqliteConnection,
    hospital_id: i64,
    available_beds: i64,
    icu_available: i64,
    emergency_available: i64,
    general_available: i64,
    updated_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let query = r#"
        UPDATE hospitals
        SET available_beds = ?1,
            icu_available = ?2,
            emergency_available = ?3,
            general_available = ?4,
            updated_at = ?5
        WHERE hospital_id = ?6
    "#;

    sqlx::query(query)
        .bind(available_beds)
        .bind(icu_available)
        .bind(emergency_available)
        .bind(general_available)
        .bind(updated_at)
        .bind(hospital_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// 追加一条审计日志：更新前的容量 + 更新后的可用数
pub async fn append_bed_status_log(
    conn: &mut SqliteConnection,
    hospital_id: i64,
    capacity: &BedCapacity,
    available_beds: i64,
    icu_available: i64,
    emergency_available: i64,
    logged_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let query = r#"
        INSERT INTO bed_status_log
        (hospital_id, total_beds, available_beds, icu_beds, icu_available, emergency_beds, emergency_available, logged_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#;

    sqlx::query(query)
        .bind(hospital_id)
        .bind(capacity.total_beds)
        .bind(available_beds)
        .bind(capacity.icu_beds)
        .bind(icu_available)
        .bind(capacity.emergency_beds)
        .bind(emergency_available)
        .bind(logged_at)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
