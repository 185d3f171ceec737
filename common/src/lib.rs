//! EcoBalance360 Common Library
//!
//! CLIとWeb(WASM)で共有される型と状態管理:
//! - データセット・フィルタ・選択の同期
//! - 地図マーカーの差分更新
//! - 市町村ごとの会話セッションと永続化
//! - 会話レポートのエクスポート

pub mod types;
pub mod error;
pub mod format;
pub mod dataset;
pub mod filter;
pub mod selection;
pub mod map;
pub mod conversation;
pub mod generation;
pub mod store;
pub mod prompts;
pub mod panel;
pub mod export;

pub use types::{Classification, EmissionBreakdown, EmissionSource, Profile, Unit, UnitId};
pub use error::{Error, GenerationError, Result};
pub use dataset::{balance_ranking, parse_units, DatasetStore, LoadState};
pub use filter::{apply_filter, FilterCriteria};
pub use selection::{SelectionCoordinator, DEFAULT_UNIT_NAME};
pub use map::{MapSurface, MarkerLayer, MarkerSpec, ViewMode};
pub use conversation::{
    run_generation, ChatMessage, Completion, ConversationManager, ConversationState,
    GenerationKind, PendingGeneration, Role, Ticket,
};
pub use generation::{GenerationRequest, GenerationResponse, PromptMessage, TextGenerator};
pub use store::{storage_key, MemoryStore, TranscriptStore};
pub use export::{build_report, ExportOptions, ExportReport};
