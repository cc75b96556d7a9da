pub mod feedback;
pub mod geometry;
pub mod payload;
pub mod session;

pub use feedback::{FeedbackMessage, FeedbackState, ManualStartLabel};
pub use geometry::Rect;
pub use payload::DecodedPayload;
pub use session::{ScanStatus, SessionInfo};
