//! Base types and error handling.
//!
//! - [`StoreError`](storeerror::StoreError): error taxonomy shared by every module
//! - [`LoadReport`](loadreport::LoadReport): per-entry results of restoring a store

pub mod loadreport;
pub mod storeerror;
