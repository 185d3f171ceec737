//! 会話履歴ファイルストアのテスト
//!
//! 市町村ごとの保存・復元と破損時の扱いを検証

use ecobalance::session_store::FileTranscriptStore;
use ecobalance_common::{ChatMessage, TranscriptStore};
use tempfile::tempdir;

fn sample_transcript() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system_prompt("Eres un experto en análisis ambiental"),
        ChatMessage::assistant("**Resumen**: el municipio es emisor neto."),
        ChatMessage::user("¿Qué hago?"),
    ]
}

/// 空のストア
#[test]
fn test_session_store_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileTranscriptStore::open(dir.path());

    assert!(store.is_empty());
    assert!(store.load(68001).expect("読み込み失敗").is_none());
}

/// 保存と再オープン
#[test]
fn test_session_store_save_and_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let transcript = sample_transcript();

    let mut store = FileTranscriptStore::open(dir.path());
    store.save(68001, &transcript).expect("保存失敗");
    assert!(FileTranscriptStore::session_path(dir.path()).exists());

    let reopened = FileTranscriptStore::open(dir.path());
    assert_eq!(reopened.len(), 1);
    let loaded = reopened.load(68001).expect("読み込み失敗").expect("履歴が見つからない");
    assert_eq!(loaded, transcript);
    assert!(loaded[0].is_prompt);
}

/// 市町村ごとに独立して保存される
#[test]
fn test_session_store_partitioned_by_unit() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = FileTranscriptStore::open(dir.path());

    store.save(68001, &sample_transcript()).expect("保存失敗");
    store.save(68190, &[ChatMessage::assistant("sumidero")]).expect("保存失敗");
    store.save(68001, &[ChatMessage::assistant("reemplazo")]).expect("保存失敗");

    let reopened = FileTranscriptStore::open(dir.path());
    assert_eq!(reopened.len(), 2);
    let a = reopened.load(68001).expect("読み込み失敗").expect("履歴なし");
    let b = reopened.load(68190).expect("読み込み失敗").expect("履歴なし");
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].content, "reemplazo");
    assert_eq!(b[0].content, "sumidero");
}

/// 破損ファイルは空として扱う
#[test]
fn test_session_store_corrupted_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(FileTranscriptStore::session_path(dir.path()), "{not json").expect("書き込み失敗");

    let store = FileTranscriptStore::open(dir.path());
    assert!(store.is_empty());
}

/// 1件だけ壊れていても他の市町村は読める
#[test]
fn test_session_store_corrupted_entry() {
    let dir = tempdir().expect("Failed to create temp dir");
    let content = r#"{
        "version": 1,
        "entries": {
            "chat_68001": [{"role": "assistant"}],
            "chat_68190": [{"role": "assistant", "content": "ok", "timestamp": "2026-10-16T09:30:00Z"}]
        }
    }"#;
    std::fs::write(FileTranscriptStore::session_path(dir.path()), content).expect("書き込み失敗");

    let store = FileTranscriptStore::open(dir.path());
    assert!(store.load(68001).is_err());
    let ok = store.load(68190).expect("読み込み失敗").expect("履歴なし");
    assert_eq!(ok[0].content, "ok");
}

/// バージョン不一致は空として扱う
#[test]
fn test_session_store_version_mismatch() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(
        FileTranscriptStore::session_path(dir.path()),
        r#"{"version": 99, "entries": {"chat_1": []}}"#,
    )
    .expect("書き込み失敗");

    assert!(FileTranscriptStore::open(dir.path()).is_empty());
}

/// 削除
#[test]
fn test_session_store_clear() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = FileTranscriptStore::open(dir.path());
    store.save(68001, &sample_transcript()).expect("保存失敗");

    assert!(FileTranscriptStore::clear(dir.path()).expect("削除失敗"));
    assert!(!FileTranscriptStore::clear(dir.path()).expect("削除失敗"));
    assert!(FileTranscriptStore::open(dir.path()).is_empty());
}

// ========================================
// 複数プロセス・書き込み途中の扱い
// ========================================

/// 同じディレクトリを開いた2つのストアが互いの市町村を消さない
#[test]
fn test_session_store_two_stores_keep_both_units() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut first = FileTranscriptStore::open(dir.path());
    let mut second = FileTranscriptStore::open(dir.path());

    first.save(68001, &sample_transcript()).expect("保存失敗");
    second.save(68190, &[ChatMessage::assistant("sumidero")]).expect("保存失敗");
    first.save(68001, &[ChatMessage::assistant("reemplazo")]).expect("保存失敗");

    let reopened = FileTranscriptStore::open(dir.path());
    assert_eq!(reopened.len(), 2);
    let a = reopened.load(68001).expect("読み込み失敗").expect("履歴なし");
    let b = reopened.load(68190).expect("読み込み失敗").expect("履歴なし");
    assert_eq!(a[0].content, "reemplazo");
    assert_eq!(b[0].content, "sumidero");

    // 保存後は他方の市町村も手元から読める
    assert!(first.load(68190).expect("読み込み失敗").is_some());
}

/// 途中で壊れたファイルがあっても、手元の市町村を失わずに書き直す
#[test]
fn test_session_store_rewrites_truncated_file_from_memory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = FileTranscriptStore::open(dir.path());
    store.save(68001, &sample_transcript()).expect("保存失敗");

    let path = FileTranscriptStore::session_path(dir.path());
    std::fs::write(&path, r#"{"version": 1, "entries": {"chat_68"#).expect("書き込み失敗");

    store.save(68190, &[ChatMessage::assistant("sumidero")]).expect("保存失敗");

    let reopened = FileTranscriptStore::open(dir.path());
    assert_eq!(reopened.len(), 2);
    assert_eq!(
        reopened.load(68001).expect("読み込み失敗").map(|t| t.len()),
        Some(sample_transcript().len())
    );
}

/// 一時ファイルは残らない
#[test]
fn test_session_store_leaves_no_temp_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = FileTranscriptStore::open(dir.path());
    store.save(68001, &sample_transcript()).expect("保存失敗");

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .expect("ディレクトリ読み込み失敗")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["sessions.json".to_string()]);
}

/// 別プロセスで削除された履歴は復活させない
#[test]
fn test_session_store_respects_clear_from_elsewhere() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = FileTranscriptStore::open(dir.path());
    store.save(68001, &sample_transcript()).expect("保存失敗");

    FileTranscriptStore::clear(dir.path()).expect("削除失敗");
    store.save(68190, &[ChatMessage::assistant("sumidero")]).expect("保存失敗");

    let reopened = FileTranscriptStore::open(dir.path());
    assert_eq!(reopened.len(), 1);
    assert!(reopened.load(68001).expect("読み込み失敗").is_none());
}
