//! Anonymous community wellbeing surveys: questionnaires, scoring, storage,
//! aggregation for public dashboards, and admin summaries and exports.

pub mod aggregate;
pub mod auth;
pub mod collector;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod questionnaire;
pub mod report;
pub mod scoring;
pub mod store;
pub mod summary;
pub mod telemetry;
