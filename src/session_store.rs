//! 会話履歴ファイルストア
//!
//! 全市町村の履歴を1つのJSONファイルに `chat_<id>` キーで保持する。
//! 保存時はディスク上の最新内容を読み直して自分のキーだけ差し替え、
//! 一時ファイルへ書いてから rename で置き換える（他プロセスの市町村を消さない）。
//! エントリ単位で復号するため、1件が壊れていても他の市町村には影響しない。

use ecobalance_common::store::storage_key;
use ecobalance_common::{ChatMessage, Error as CommonError, Result as CommonResult, TranscriptStore, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const SESSION_FILE_NAME: &str = "sessions.json";

/// セッションファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// ストレージキー → 履歴
    entries: BTreeMap<String, serde_json::Value>,
}

impl SessionFile {
    const CURRENT_VERSION: u32 = 1;
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// ファイルに永続化する履歴ストア
#[derive(Debug)]
pub struct FileTranscriptStore {
    path: PathBuf,
    file: SessionFile,
}

impl FileTranscriptStore {
    pub fn session_path(dir: &Path) -> PathBuf {
        dir.join(SESSION_FILE_NAME)
    }

    /// セッションファイルを開く
    ///
    /// 存在しない・読めない・バージョン不一致の場合は空として始める。
    pub fn open(dir: &Path) -> Self {
        let path = Self::session_path(dir);
        let file = match Self::read_file(&path) {
            Ok(file) => file.unwrap_or_default(),
            Err(reason) => {
                log::warn!("{}, starting fresh", reason);
                SessionFile::default()
            }
        };
        Self { path, file }
    }

    /// # Returns
    /// 存在しなければ `Ok(None)`、壊れている・非対応バージョンなら `Err(理由)`
    fn read_file(path: &Path) -> std::result::Result<Option<SessionFile>, String> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)
            .map_err(|e| format!("cannot open session file {}: {}", path.display(), e))?;

        match serde_json::from_reader::<_, SessionFile>(BufReader::new(file)) {
            Ok(session) if session.version == SessionFile::CURRENT_VERSION => Ok(Some(session)),
            Ok(session) => Err(format!("session file version {} not supported", session.version)),
            Err(e) => Err(format!("session file {} is corrupted: {}", path.display(), e)),
        }
    }

    /// ディスク上の最新内容
    ///
    /// 他プロセスの保存分を取り込む。削除済みなら空、壊れていれば手元の内容で書き直す。
    fn latest(&self) -> SessionFile {
        match Self::read_file(&self.path) {
            Ok(Some(file)) => file,
            Ok(None) => SessionFile::default(),
            Err(reason) => {
                log::warn!("{}, rewriting from memory", reason);
                self.file.clone()
            }
        }
    }

    /// 一時ファイルに書いてから置き換える
    fn write_file(path: &Path, file: &SessionFile) -> CommonResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, file)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存済みの市町村数
    pub fn len(&self) -> usize {
        self.file.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.entries.is_empty()
    }

    /// セッションファイルを削除
    ///
    /// # Returns
    /// 削除した場合 `true`、元々存在しなければ `false`
    pub fn clear(dir: &Path) -> std::io::Result<bool> {
        let path = Self::session_path(dir);
        if path.exists() {
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

impl TranscriptStore for FileTranscriptStore {
    fn load(&self, unit_id: UnitId) -> CommonResult<Option<Vec<ChatMessage>>> {
        match self.file.entries.get(&storage_key(unit_id)) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| CommonError::Storage(format!("corrupted transcript: {}", e))),
            None => Ok(None),
        }
    }

    fn save(&mut self, unit_id: UnitId, transcript: &[ChatMessage]) -> CommonResult<()> {
        let value = serde_json::to_value(transcript)?;
        let mut latest = self.latest();
        latest.entries.insert(storage_key(unit_id), value);
        Self::write_file(&self.path, &latest)?;
        self.file = latest;
        Ok(())
    }
}
