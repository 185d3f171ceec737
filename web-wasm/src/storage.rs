//! sessionStorage 上の会話履歴
//!
//! キーは `chat_<id>`、値は履歴全体のJSON。タブを閉じると消える。

use ecobalance_common::store::{decode_transcript, encode_transcript, storage_key};
use ecobalance_common::{ChatMessage, Error, Result, TranscriptStore, UnitId};
use gloo::storage::{SessionStorage, Storage};

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionTranscriptStore;

impl TranscriptStore for SessionTranscriptStore {
    fn load(&self, unit_id: UnitId) -> Result<Option<Vec<ChatMessage>>> {
        let raw = SessionStorage::raw()
            .get_item(&storage_key(unit_id))
            .map_err(|e| Error::Storage(format!("{:?}", e)))?;
        raw.as_deref().map(decode_transcript).transpose()
    }

    fn save(&mut self, unit_id: UnitId, transcript: &[ChatMessage]) -> Result<()> {
        let raw = encode_transcript(transcript)?;
        SessionStorage::raw()
            .set_item(&storage_key(unit_id), &raw)
            .map_err(|e| Error::Storage(format!("{:?}", e)))
    }
}
