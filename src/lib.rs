//! EcoBalance360 CLI
//!
//! 市町村のカーボンバランスデータを一覧・詳細表示し、
//! 選択した市町村についてAIと対話してHTMLレポートに出力する。

pub mod ai_provider;
pub mod chat;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod generator;
pub mod session_store;
