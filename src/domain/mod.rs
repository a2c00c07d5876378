//! Core domain types and logic.

pub mod backtest;
pub mod balance;
pub mod bar;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod order;
pub mod recorder;
pub mod session;
pub mod strategy;
