//! Billing automation for the multi-tenant clinic platform: grace-period
//! risk scoring and the invoice reminder dispatch engine, exposed over HTTP
//! by the companion `billing-ai-api` service.

pub mod billing;
pub mod config;
pub mod error;
pub mod telemetry;
