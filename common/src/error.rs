//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    #[error("Transcript is empty, nothing to export")]
    EmptyTranscript,
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// テキスト生成サービス呼び出しの失敗
///
/// 伝播させずに会話履歴へのエラーメッセージとして回収されるため、
/// `Error` とは別の値型として扱う。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("service returned {status}: {error}")]
    Service {
        status: u16,
        error: String,
        details: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_config() {
        let error = Error::Config("設定ファイルが見つかりません".to_string());
        assert_eq!(format!("{}", error), "Config error: 設定ファイルが見つかりません");
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn test_error_display_unknown_unit() {
        let error = Error::UnknownUnit("ATLANTIS".to_string());
        assert_eq!(format!("{}", error), "Unknown unit: ATLANTIS");
    }

    #[test]
    fn test_generation_error_display() {
        let error = GenerationError::Service {
            status: 500,
            error: "boom".to_string(),
            details: "stack".to_string(),
        };
        assert_eq!(format!("{}", error), "service returned 500: boom");
        assert_eq!(
            format!("{}", GenerationError::Timeout(90)),
            "request timed out after 90 seconds"
        );
    }
}
