pub mod approval;
pub mod attendance;
pub mod auth;
pub mod posting;
pub mod projection;
pub mod records;

pub use approval::ApprovalService;
pub use attendance::{AttendanceService, DailyAttendance};
pub use auth::Claims;
pub use posting::PostingDispatcher;
pub use projection::ScheduleService;
pub use records::{RecordService, RecordTypeRegistry};
