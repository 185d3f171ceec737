//! ビルド時設定

use log::LevelFilter;

/// データセットの配置先
pub const DATASET_URL: &str = "/data/santander-data.json";

/// 生成サービスのエンドポイント
pub const ANALYSIS_ENDPOINT: &str = "/api/ai-analysis";

/// 生成リクエストの打ち切り秒数
pub const GENERATION_TIMEOUT_SECS: u64 = 120;

pub const LOG_LEVEL: LevelFilter = if cfg!(debug_assertions) {
    LevelFilter::Debug
} else {
    LevelFilter::Info
};
