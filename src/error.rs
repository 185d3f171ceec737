use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcoBalanceError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`ecobalance config --set-api-key YOUR_KEY` または GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("データセット読み込みエラー: {0}")]
    DatasetLoad(String),

    #[error("市町村が見つかりません: {0}")]
    UnitNotFound(String),

    #[error("セッション保存エラー: {0}")]
    SessionStore(String),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] ecobalance_common::Error),
}

impl From<dialoguer::Error> for EcoBalanceError {
    fn from(e: dialoguer::Error) -> Self {
        EcoBalanceError::Prompt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EcoBalanceError>;
