pub mod calendar;
pub mod duration;
pub mod slots;
