pub mod accounts;
pub mod dashboard;
pub mod enrollment;
pub mod reminders;
pub mod screenings;
pub mod tracking;
