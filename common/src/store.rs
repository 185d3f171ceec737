//! 会話履歴の永続化
//!
//! 市町村ごとに `chat_<id>` キーで履歴全体をJSON文字列として保存する。
//! Webではブラウザのセッションストレージ、CLIではファイルが実装を提供する。

use crate::conversation::ChatMessage;
use crate::error::{Error, Result};
use crate::types::UnitId;
use std::collections::HashMap;

pub const STORAGE_KEY_PREFIX: &str = "chat_";

pub fn storage_key(unit_id: UnitId) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, unit_id)
}

pub fn encode_transcript(transcript: &[ChatMessage]) -> Result<String> {
    Ok(serde_json::to_string(transcript)?)
}

pub fn decode_transcript(raw: &str) -> Result<Vec<ChatMessage>> {
    serde_json::from_str(raw).map_err(|e| Error::Storage(format!("corrupted transcript: {}", e)))
}

/// 履歴ストア
pub trait TranscriptStore {
    /// 保存済み履歴。未保存なら `None`
    fn load(&self, unit_id: UnitId) -> Result<Option<Vec<ChatMessage>>>;

    /// 履歴全体を上書き保存
    fn save(&mut self, unit_id: UnitId, transcript: &[ChatMessage]) -> Result<()>;
}

/// プロセス内メモリのストア
///
/// 保存形式はキー → JSON文字列で、セッションストレージと同じ形を取る。
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TranscriptStore for MemoryStore {
    fn load(&self, unit_id: UnitId) -> Result<Option<Vec<ChatMessage>>> {
        self.raw(&storage_key(unit_id))
            .map(decode_transcript)
            .transpose()
    }

    fn save(&mut self, unit_id: UnitId, transcript: &[ChatMessage]) -> Result<()> {
        let encoded = encode_transcript(transcript)?;
        self.entries.insert(storage_key(unit_id), encoded);
        Ok(())
    }
}
