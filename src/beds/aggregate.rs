//! 床位状态汇总
//!
//! 对全部医院逐一分级（总床位 / ICU / 急诊），同时折叠出一份全局概览

use serde::Serialize;

use super::status::{classify, BedStatus};
use crate::storage::models::Hospital;

/// 全局概览：各项求和与三档医院计数
///
/// 求和与计数均与输入顺序无关；Unknown 的医院不计入任何档位
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BedSummary {
    pub total_hospitals: i64,
    pub total_beds: i64,
    pub total_available: i64,
    pub icu_total: i64,
    pub icu_available: i64,
    pub emergency_total: i64,
    pub emergency_available: i64,
    pub hospitals_full: i64,
    pub hospitals_limited: i64,
    pub hospitals_available: i64,
}

impl BedSummary {
    /// 把一家医院并入概览
    fn fold(&mut self, hospital: &Hospital, overall: BedStatus) {
        self.total_hospitals += 1;
        self.total_beds += hospital.total_beds;
        self.total_available += hospital.available_beds;
        self.icu_total += hospital.icu_beds;
        self.icu_available += hospital.icu_available;
        self.emergency_total += hospital.emergency_beds;
        self.emergency_available += hospital.emergency_available;

        match overall {
            BedStatus::Available => self.hospitals_available += 1,
            BedStatus::Limited => self.hospitals_limited += 1,
            BedStatus::Full => self.hospitals_full += 1,
            BedStatus::Unknown => {}
        }
    }
}

/// 带三组分级结果的医院记录
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedHospital {
    #[serde(flatten)]
    pub hospital: Hospital,
    pub status: BedStatus,
    pub icu_status: BedStatus,
    pub emergency_status: BedStatus,
    pub availability_percentage: f64,
    pub icu_percentage: f64,
    pub emergency_percentage: f64,
}

impl ClassifiedHospital {
    /// 对一家医院的三个床位池独立分级
    pub fn new(hospital: Hospital) -> Self {
        let overall = classify(hospital.available_beds, hospital.total_beds);
        let icu = classify(hospital.icu_available, hospital.icu_beds);
        let emergency = classify(hospital.emergency_available, hospital.emergency_beds);

        Self {
            hospital,
            status: overall.status,
            icu_status: icu.status,
            emergency_status: emergency.status,
            availability_percentage: overall.percentage,
            icu_percentage: icu.percentage,
            emergency_percentage: emergency.percentage,
        }
    }
}

/// 医院列表接口用的精简视图：只附总床位档位
#[derive(Debug, Clone, Serialize)]
pub struct HospitalWithStatus {
    #[serde(flatten)]
    pub hospital: Hospital,
    pub status: BedStatus,
    pub availability_percentage: f64,
}

impl HospitalWithStatus {
    pub fn new(hospital: Hospital) -> Self {
        let overall = classify(hospital.available_beds, hospital.total_beds);
        Self {
            hospital,
            status: overall.status,
            availability_percentage: overall.percentage,
        }
    }
}

/// 汇总结果：概览 + 保持输入顺序的医院列表
#[derive(Debug, Clone, Serialize)]
pub struct BedStatusReport {
    pub summary: BedSummary,
    pub hospitals: Vec<ClassifiedHospital>,
}

/// 汇总全部医院的床位状态
///
/// 输入应已按地区、名称排序；输出列表保持输入顺序
pub fn aggregate(hospitals: Vec<Hospital>) -> BedStatusReport {
    let mut summary = BedSummary::default();
    let mut classified = Vec::with_capacity(hospitals.len());

    for hospital in hospitals {
        let entry = ClassifiedHospital::new(hospital);
        summary.fold(&entry.hospital, entry.status);
        classified.push(entry);
    }

    BedStatusReport {
        summary,
        hospitals: classified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hospital(name: &str, total: i64, available: i64) -> Hospital {
        Hospital {
            hospital_id: 0,
            name: name.to_string(),
            address: String::new(),
            region: "測試區".to_string(),
            phone: String::new(),
            email: String::new(),
            logo_url: None,
            total_beds: total,
            available_beds: available,
            icu_beds: 10,
            icu_available: 5,
            emergency_beds: 20,
            emergency_available: 1,
            general_beds: total - 30,
            general_available: available - 6,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_aggregate_empty() {
        let report = aggregate(vec![]);
        assert_eq!(report.summary, BedSummary::default());
        assert!(report.hospitals.is_empty());
    }

    #[test]
    fn test_aggregate_sums_and_buckets() {
        let report = aggregate(vec![
            hospital("甲", 100, 50), // available
            hospital("乙", 100, 15), // limited
            hospital("丙", 100, 5),  // full
            hospital("丁", 0, 0),    // unknown，不计入档位
        ]);

        let s = &report.summary;
        assert_eq!(s.total_hospitals, 4);
        assert_eq!(s.total_beds, 300);
        assert_eq!(s.total_available, 70);
        assert_eq!(s.icu_total, 40);
        assert_eq!(s.icu_available, 20);
        assert_eq!(s.emergency_total, 80);
        assert_eq!(s.emergency_available, 4);
        assert_eq!(s.hospitals_available, 1);
        assert_eq!(s.hospitals_limited, 1);
        assert_eq!(s.hospitals_full, 1);
        // unknown 档位只体现在总数与档位计数之差
        assert_eq!(
            s.total_hospitals,
            s.hospitals_available + s.hospitals_limited + s.hospitals_full + 1
        );
    }

    #[test]
    fn test_aggregate_preserves_order() {
        let report = aggregate(vec![
            hospital("丙", 100, 5),
            hospital("甲", 100, 50),
            hospital("乙", 100, 15),
        ]);
        let names: Vec<&str> = report
            .hospitals
            .iter()
            .map(|h| h.hospital.name.as_str())
            .collect();
        assert_eq!(names, vec!["丙", "甲", "乙"]);
    }

    #[test]
    fn test_summary_order_independent() {
        let a = vec![
            hospital("甲", 100, 50),
            hospital("乙", 100, 15),
            hospital("丙", 100, 5),
        ];
        let mut b = a.clone();
        b.reverse();

        assert_eq!(aggregate(a).summary, aggregate(b).summary);
    }

    #[test]
    fn test_three_pools_classified_independently() {
        let mut h = hospital("甲", 100, 50);
        h.icu_available = 0; // ICU 0/10 -> full
        h.emergency_available = 20; // 急诊 20/20 -> available
        let report = aggregate(vec![h]);
        let entry = &report.hospitals[0];
        assert_eq!(entry.status, BedStatus::Available);
        assert_eq!(entry.icu_status, BedStatus::Full);
        assert_eq!(entry.emergency_status, BedStatus::Available);
        assert_eq!(entry.availability_percentage, 50.0);
        assert_eq!(entry.icu_percentage, 0.0);
        assert_eq!(entry.emergency_percentage, 100.0);
    }
}
