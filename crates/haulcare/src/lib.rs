//! Case management for a driver wellness nonprofit.
//!
//! The crate hosts the enrollment wizard (ordered sections, per-section
//! validation, a single guarded submission), the record boundary the wizard
//! submits into, and the administrative workflows layered on the same
//! records: accounts, application review, screening requests, weekly
//! Healthy Habits tracking, meeting reminders, dashboards and data export.

pub mod config;
pub mod error;
pub mod outcome;
pub mod records;
pub mod telemetry;
pub mod workflows;
