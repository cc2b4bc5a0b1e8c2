//! Core data types for the instructor payments engine

pub mod account;
pub mod error;
pub mod payment;
pub mod snapshot;

pub use account::{AccountId, AccountStatus, InstructorId, PaymentAccount, User, UserPatch};
pub use error::EngineError;
pub use payment::{CourseId, Payment, PaymentId, PaymentStatus, StudentId, TransferStatus};
pub use snapshot::{
    CourseRevenue, EarningsSnapshot, MonthBucket, COURSE_COLOR_PALETTE, COURSE_RANKING_SIZE,
};
