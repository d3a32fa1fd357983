//! 床位域逻辑
//!
//! 分级（纯函数）、汇总（折叠概览）、更新（事务写入 + 审计日志）

pub mod aggregate;
pub mod status;
pub mod update;

pub use aggregate::{aggregate, BedStatusReport, BedSummary, ClassifiedHospital, HospitalWithStatus};
pub use status::{classify, BedClassification, BedStatus};
pub use update::{BedStatusUpdate, UpdateOutcome};
