pub mod registrations;
pub mod uploads;
