//! 会話フローの統合テスト
//!
//! スクリプト化した生成器とファイルストアで、選択切替・遅延応答・タイムアウトを検証

use ecobalance::session_store::FileTranscriptStore;
use ecobalance_common::prompts::{SERVICE_ERROR_MESSAGE, TIMEOUT_ERROR_MESSAGE};
use ecobalance_common::{
    run_generation, Completion, ConversationManager, ConversationState, EmissionBreakdown,
    GenerationError, GenerationRequest, TextGenerator, TranscriptStore, Unit,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tempfile::tempdir;

fn create_test_unit(id: u32, name: &str, balance: f64) -> Unit {
    Unit {
        id,
        name: name.to_string(),
        population: 50_000,
        total_emissions: 120_000.0,
        forest_capture: 20_000.0,
        balance,
        emissions_per_capita: 2.4,
        balance_per_capita: balance / 50_000.0,
        classification: "Emisor".into(),
        profile: "Mixto-Transición".into(),
        index: 40.0,
        cluster: 2,
        latitude: 7.1,
        longitude: -73.1,
        emissions: EmissionBreakdown {
            energy: 60_000.0,
            industrial_processes: 10_000.0,
            agriculture: 30_000.0,
            waste: 15_000.0,
            deforestation: 5_000.0,
        },
    }
}

/// 事前に決めた応答を順に返す生成器
struct ScriptedGenerator {
    replies: RefCell<VecDeque<Result<String, GenerationError>>>,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> impl Future<Output = Result<String, GenerationError>> {
        self.requests.borrow_mut().push(request.clone());
        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Network("script exhausted".into())));
        async move { reply }
    }
}

/// 応答しない生成器
struct HangingGenerator;

impl TextGenerator for HangingGenerator {
    fn generate(&self, _request: &GenerationRequest) -> impl Future<Output = Result<String, GenerationError>> {
        std::future::pending()
    }
}

// ========================================
// 基本フロー
// ========================================

#[tokio::test]
async fn test_initial_then_reply_persists_every_turn() {
    let dir = tempdir().expect("Failed to create temp dir");
    let unit = create_test_unit(68001, "BUCARAMANGA", 90_000.0);
    let generator = ScriptedGenerator::new(vec![
        Ok("Análisis inicial".into()),
        Ok("Respuesta 1".into()),
    ]);

    let mut manager = ConversationManager::new(FileTranscriptStore::open(dir.path()), "gemini-1.5-flash");
    assert_eq!(manager.select_unit(&unit), ConversationState::Empty);

    let pending = manager.open_analysis().expect("初回リクエストなし");
    run_generation(&mut manager, &generator, pending).await;
    assert_eq!(manager.transcript().len(), 2);

    let pending = manager.send("¿Fuentes principales?").expect("送信できない");
    run_generation(&mut manager, &generator, pending).await;
    assert_eq!(manager.transcript().len(), 4);

    // 生成器に渡ったリクエスト
    let requests = generator.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].messages.is_empty());
    assert_eq!(requests[1].messages.len(), 1);
    assert_eq!(requests[1].user_message.as_deref(), Some("¿Fuentes principales?"));
    assert_eq!(requests[1].model, "gemini-1.5-flash");

    // 再オープンしたストアと一致
    let reopened = FileTranscriptStore::open(dir.path());
    let stored = reopened.load(68001).expect("読み込み失敗").expect("履歴なし");
    assert_eq!(stored, manager.transcript());
}

#[tokio::test]
async fn test_restored_session_skips_initial_generation() {
    let dir = tempdir().expect("Failed to create temp dir");
    let unit = create_test_unit(68307, "GIRÓN", 300_000.0);

    {
        let generator = ScriptedGenerator::new(vec![Ok("primera vez".into())]);
        let mut manager = ConversationManager::new(FileTranscriptStore::open(dir.path()), "gemini-2.0-flash-exp");
        manager.select_unit(&unit);
        let pending = manager.open_analysis().expect("初回リクエストなし");
        run_generation(&mut manager, &generator, pending).await;
    }

    // 新しいプロセス相当
    let mut manager = ConversationManager::new(FileTranscriptStore::open(dir.path()), "gemini-2.0-flash-exp");
    assert_eq!(manager.select_unit(&unit), ConversationState::Idle);
    assert!(manager.open_analysis().is_none());
    assert_eq!(manager.visible_messages().next().map(|m| m.content.as_str()), Some("primera vez"));
}

#[tokio::test]
async fn test_service_failure_inserts_error_message() {
    let dir = tempdir().expect("Failed to create temp dir");
    let unit = create_test_unit(68001, "BUCARAMANGA", 90_000.0);
    let generator = ScriptedGenerator::new(vec![
        Ok("ok".into()),
        Err(GenerationError::Service { status: 500, error: "boom".into(), details: String::new() }),
    ]);

    let mut manager = ConversationManager::new(FileTranscriptStore::open(dir.path()), "gemini-1.5-flash");
    manager.select_unit(&unit);
    let pending = manager.open_analysis().expect("初回リクエストなし");
    run_generation(&mut manager, &generator, pending).await;

    let pending = manager.send("hola").expect("送信できない");
    let completion = run_generation(&mut manager, &generator, pending).await;
    assert_eq!(completion, Completion::Applied { unit_id: 68001, failed: true });
    assert_eq!(manager.state(), ConversationState::Idle);
    assert_eq!(manager.transcript().last().map(|m| m.content.as_str()), Some(SERVICE_ERROR_MESSAGE));
}

// ========================================
// 切替・遅延応答・タイムアウト
// ========================================

#[tokio::test]
async fn test_late_response_after_switching_units() {
    let dir = tempdir().expect("Failed to create temp dir");
    let a = create_test_unit(68001, "BUCARAMANGA", 90_000.0);
    let b = create_test_unit(68679, "SAN GIL", 1_000.0);
    let generator = ScriptedGenerator::new(vec![Ok("análisis de A".into())]);

    let mut manager = ConversationManager::new(FileTranscriptStore::open(dir.path()), "gemini-1.5-flash");
    manager.select_unit(&a);
    let pending_a = manager.open_analysis().expect("初回リクエストなし");

    // Aの応答が届く前にBへ切り替え
    manager.select_unit(&b);
    let outcome = generator.generate(&pending_a.request).await;
    manager.complete(pending_a.ticket, outcome);

    assert!(manager.transcript().is_empty());
    assert_eq!(manager.state(), ConversationState::Empty);
    assert_eq!(manager.state_of(a.id), ConversationState::Idle);

    let reopened = FileTranscriptStore::open(dir.path());
    assert!(reopened.load(b.id).expect("読み込み失敗").is_none());
    assert_eq!(reopened.load(a.id).expect("読み込み失敗").map(|t| t.len()), Some(2));

    manager.select_unit(&a);
    assert_eq!(manager.transcript()[1].content, "análisis de A");
}

#[tokio::test]
async fn test_hung_request_times_out_to_idle() {
    let dir = tempdir().expect("Failed to create temp dir");
    let unit = create_test_unit(68001, "BUCARAMANGA", 90_000.0);
    let mut manager = ConversationManager::new(FileTranscriptStore::open(dir.path()), "gemini-1.5-flash");
    manager.select_unit(&unit);
    let pending = manager.open_analysis().expect("初回リクエストなし");

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        HangingGenerator.generate(&pending.request),
    )
    .await;
    assert!(outcome.is_err());

    manager.expire(pending.ticket, 1);
    assert_eq!(manager.state(), ConversationState::Idle);
    assert_eq!(manager.transcript()[0].content, TIMEOUT_ERROR_MESSAGE);

    // 打ち切り後の応答は破棄
    assert_eq!(manager.complete(pending.ticket, Ok("tarde".into())), Completion::Stale);
    assert_eq!(manager.transcript().len(), 1);
}
