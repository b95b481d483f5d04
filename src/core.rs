//! Metrics collection, ROI modelling and reporting.

pub(crate) mod api;
pub(crate) mod calculator;
pub(crate) mod collector;
pub(crate) mod commands;
pub(crate) mod models;
pub(crate) mod report;
