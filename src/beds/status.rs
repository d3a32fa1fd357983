//! 床位状态分级
//!
//! 纯函数：由（可用数, 总数）计算状态档位与可用率

use serde::{Deserialize, Serialize};

/// 状态为 available 的最低可用率（百分比）
pub const AVAILABLE_THRESHOLD: f64 = 30.0;
/// 状态为 limited 的最低可用率（百分比），低于则为 full
pub const LIMITED_THRESHOLD: f64 = 10.0;

/// 床位状态档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BedStatus {
    /// 可用率 >= 30%
    Available,
    /// 可用率 >= 10% 且 < 30%
    Limited,
    /// 可用率 < 10%
    Full,
    /// 总床位为 0，无法计算
    Unknown,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedStatus::Available => "available",
            BedStatus::Limited => "limited",
            BedStatus::Full => "full",
            BedStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个床位池的分级结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedClassification {
    pub status: BedStatus,
    /// 可用率，保留一位小数
    pub percentage: f64,
}

/// 计算可用率，保留一位小数；总数 <= 0 时返回 0
pub fn availability_percentage(available: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = available as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// 对一个床位池分级
///
/// 三档阈值对总床位、ICU、急诊统一适用；总数 <= 0 一律判为 Unknown
pub fn classify(available: i64, total: i64) -> BedClassification {
    if total <= 0 {
        return BedClassification {
            status: BedStatus::Unknown,
            percentage: 0.0,
        };
    }

    let percentage = availability_percentage(available, total);
    let status = if percentage >= AVAILABLE_THRESHOLD {
        BedStatus::Available
    } else if percentage >= LIMITED_THRESHOLD {
        BedStatus::Limited
    } else {
        BedStatus::Full
    };

    BedClassification { status, percentage }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_available() {
        let c = classify(30, 100);
        assert_eq!(c.status, BedStatus::Available);
        assert_eq!(c.percentage, 30.0);

        let c = classify(100, 100);
        assert_eq!(c.status, BedStatus::Available);
        assert_eq!(c.percentage, 100.0);
    }

    #[test]
    fn test_classify_limited() {
        let c = classify(10, 100);
        assert_eq!(c.status, BedStatus::Limited);
        assert_eq!(c.percentage, 10.0);

        let c = classify(29, 100);
        assert_eq!(c.status, BedStatus::Limited);
        assert_eq!(c.percentage, 29.0);
    }

    #[test]
    fn test_classify_full() {
        let c = classify(9, 100);
        assert_eq!(c.status, BedStatus::Full);
        assert_eq!(c.percentage, 9.0);

        let c = classify(0, 100);
        assert_eq!(c.status, BedStatus::Full);
        assert_eq!(c.percentage, 0.0);
    }

    #[test]
    fn test_classify_unknown_when_total_zero() {
        // 总数为 0 时可用数不影响结果
        for available in [0, 5, 100] {
            let c = classify(available, 0);
            assert_eq!(c.status, BedStatus::Unknown);
            assert_eq!(c.percentage, 0.0);
        }
        let c = classify(3, -1);
        assert_eq!(c.status, BedStatus::Unknown);
    }

    #[test]
    fn test_percentage_rounded_to_one_decimal() {
        // 1/3 = 33.333... -> 33.3
        assert_eq!(availability_percentage(1, 3), 33.3);
        // 2/3 = 66.666... -> 66.7
        assert_eq!(availability_percentage(2, 3), 66.7);
        // 1/7 = 14.2857... -> 14.3
        assert_eq!(availability_percentage(1, 7), 14.3);
    }

    #[test]
    fn test_threshold_boundaries() {
        // 恰好 30.0% -> available
        assert_eq!(classify(3, 10).status, BedStatus::Available);
        // 恰好 10.0% -> limited
        assert_eq!(classify(1, 10).status, BedStatus::Limited);
        // 9.96% 四舍五入到 10.0 -> limited（阈值作用于舍入后的值）
        assert_eq!(availability_percentage(249, 2500), 10.0);
        assert_eq!(classify(249, 2500).status, BedStatus::Limited);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BedStatus::Available).unwrap(),
            "\"available\""
        );
        assert_eq!(serde_json::to_string(&BedStatus::Unknown).unwrap(), "\"unknown\"");
    }
}
