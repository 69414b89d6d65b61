pub mod booking;
pub mod event;
pub mod seat;

pub use booking::{BookingRecord, BookingStatus};
pub use event::EventInfo;
pub use seat::{SeatEntry, SeatStatus};
