//! テキスト生成サービスとの契約
//!
//! リクエスト/レスポンスのJSON形:
//! - リクエスト: `{ unit, messages: [{role, content}], userMessage?, model }`
//! - 成功: `{ analysis }`
//! - 失敗: `{ error, details }`
//!
//! 実際の送信手段（HTTP、CLIサブプロセス、テスト用スクリプト）は
//! `TextGenerator` 実装側に閉じ込める。

use crate::conversation::{ChatMessage, Role};
use crate::error::GenerationError;
use crate::types::Unit;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// 会話履歴の1件（サービス送信用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for PromptMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// 生成リクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub unit: Unit,
    pub messages: Vec<PromptMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    pub model: String,
}

/// 生成成功レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub analysis: String,
}

/// 生成失敗レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub error: String,
    #[serde(default)]
    pub details: String,
}

impl GenerationFailure {
    pub fn into_error(self, status: u16) -> GenerationError {
        GenerationError::Service {
            status,
            error: self.error,
            details: self.details,
        }
    }
}

/// HTTPステータスと本文から生成結果を解釈
///
/// 2xx以外は本文が `{error, details}` でなくても Service エラーになる。
pub fn interpret_response(status: u16, body: &str) -> Result<String, GenerationError> {
    if (200..300).contains(&status) {
        let response: GenerationResponse = serde_json::from_str(body)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        return Ok(response.analysis);
    }

    match serde_json::from_str::<GenerationFailure>(body) {
        Ok(failure) => Err(failure.into_error(status)),
        Err(_) => Err(GenerationError::Service {
            status,
            error: format!("HTTP {}", status),
            details: body.chars().take(200).collect(),
        }),
    }
}

/// テキスト生成バックエンド
pub trait TextGenerator {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, GenerationError>>;
}
