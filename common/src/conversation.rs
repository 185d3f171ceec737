//! 市町村ごとの会話セッション管理
//!
//! 状態遷移:
//! ```text
//! Empty ──open_analysis──▶ GeneratingInitial ──complete──▶ Idle
//! Idle  ──send──────────▶ GeneratingReply   ──complete──▶ Idle
//! ```
//!
//! 生成リクエストの送信自体は呼び出し側（Web/CLI）が行う。
//! マネージャは `PendingGeneration` を返し、結果は `complete` で受け取る。
//! 各リクエストは発行元の市町村IDを含むチケットで識別され、
//! 別の市町村へ切り替えた後に届いた応答も発行元の履歴へ正しく反映される。

use crate::error::GenerationError;
use crate::generation::{GenerationRequest, PromptMessage, TextGenerator};
use crate::prompts::{build_system_context, failure_message};
use crate::store::TranscriptStore;
use crate::types::{Unit, UnitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 発話者
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// 画面・エクスポート上の表示名
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Usuario",
            Role::Assistant => "Asistente IA",
            Role::System => "Contexto del sistema",
        }
    }
}

/// 会話メッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// システム文脈（通常は非表示）
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_prompt: bool,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_prompt: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system_prompt(content: impl Into<String>) -> Self {
        Self {
            is_prompt: true,
            ..Self::new(Role::System, content)
        }
    }
}

/// 会話の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Empty,
    GeneratingInitial,
    Idle,
    GeneratingReply,
}

impl ConversationState {
    pub fn is_generating(&self) -> bool {
        matches!(self, Self::GeneratingInitial | Self::GeneratingReply)
    }
}

/// 生成リクエストの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Initial,
    Reply,
}

/// 発行済みリクエストの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub unit_id: UnitId,
    seq: u64,
}

/// 送信待ちの生成リクエスト
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    pub ticket: Ticket,
    pub kind: GenerationKind,
    pub request: GenerationRequest,
}

/// `complete` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 発行元の履歴へ反映した
    Applied { unit_id: UnitId, failed: bool },
    /// 既に完了済み（タイムアウト後の遅延応答など）のため破棄
    Stale,
}

struct Session {
    unit: Unit,
    transcript: Vec<ChatMessage>,
    state: ConversationState,
    in_flight: Option<(Ticket, GenerationKind)>,
}

/// 会話マネージャ
pub struct ConversationManager<S: TranscriptStore> {
    store: S,
    model: String,
    current: Option<UnitId>,
    sessions: HashMap<UnitId, Session>,
    next_seq: u64,
}

impl<S: TranscriptStore> ConversationManager<S> {
    pub fn new(store: S, model: impl Into<String>) -> Self {
        Self {
            store,
            model: model.into(),
            current: None,
            sessions: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 以降のリクエストで使うモデルを変更（発行済みには影響しない）
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// 選択中の市町村を切り替える
    ///
    /// メモリ上のセッションがあればそのまま再開し、なければ永続ストアから復元する。
    /// 読み込み失敗や破損は「履歴なし」として扱う。
    pub fn select_unit(&mut self, unit: &Unit) -> ConversationState {
        self.current = Some(unit.id);

        if let Some(session) = self.sessions.get(&unit.id) {
            return session.state;
        }

        let transcript = match self.store.load(unit.id) {
            Ok(Some(transcript)) => transcript,
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("discarding stored transcript for {}: {}", unit.id, e);
                Vec::new()
            }
        };
        let state = if transcript.is_empty() {
            ConversationState::Empty
        } else {
            log::debug!("restored {} messages for {}", transcript.len(), unit.name);
            ConversationState::Idle
        };

        self.sessions.insert(
            unit.id,
            Session {
                unit: unit.clone(),
                transcript,
                state,
                in_flight: None,
            },
        );
        state
    }

    pub fn current_unit(&self) -> Option<&Unit> {
        self.current_session().map(|s| &s.unit)
    }

    pub fn state(&self) -> ConversationState {
        self.current_session().map(|s| s.state).unwrap_or_default()
    }

    /// 指定市町村の状態（選択中でなくてもよい）
    pub fn state_of(&self, unit_id: UnitId) -> ConversationState {
        self.sessions.get(&unit_id).map(|s| s.state).unwrap_or_default()
    }

    /// 選択中市町村の履歴全体（プロンプト含む）
    pub fn transcript(&self) -> &[ChatMessage] {
        self.current_session()
            .map(|s| s.transcript.as_slice())
            .unwrap_or(&[])
    }

    pub fn transcript_of(&self, unit_id: UnitId) -> &[ChatMessage] {
        self.sessions
            .get(&unit_id)
            .map(|s| s.transcript.as_slice())
            .unwrap_or(&[])
    }

    /// 画面に通常表示するメッセージ（プロンプト以外）
    pub fn visible_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.transcript().iter().filter(|m| !m.is_prompt)
    }

    pub fn has_visible_messages(&self) -> bool {
        self.visible_messages().next().is_some()
    }

    /// 送信可能か（Idle かつ入力が空でない）
    pub fn can_send(&self, input: &str) -> bool {
        self.state() == ConversationState::Idle && !input.trim().is_empty()
    }

    /// 発行済みで未完了のチケット
    pub fn in_flight(&self) -> Vec<Ticket> {
        self.sessions
            .values()
            .filter_map(|s| s.in_flight.map(|(ticket, _)| ticket))
            .collect()
    }

    /// 解析ビューを開く
    ///
    /// 履歴が空なら初回解析リクエストを発行する。それ以外は何もしない。
    pub fn open_analysis(&mut self) -> Option<PendingGeneration> {
        let model = self.model.clone();
        let ticket = self.issue_ticket()?;
        let session = self.sessions.get_mut(&ticket.unit_id)?;
        if session.state != ConversationState::Empty {
            return None;
        }

        session.state = ConversationState::GeneratingInitial;
        session.in_flight = Some((ticket, GenerationKind::Initial));
        log::info!("requesting initial analysis for {}", session.unit.name);

        Some(PendingGeneration {
            ticket,
            kind: GenerationKind::Initial,
            request: GenerationRequest {
                unit: session.unit.clone(),
                messages: Vec::new(),
                user_message: None,
                model,
            },
        })
    }

    /// ユーザー発話を送信
    ///
    /// 送信不可（生成中・空入力・未選択）の場合は `None` で、状態は変わらない。
    pub fn send(&mut self, input: &str) -> Option<PendingGeneration> {
        if !self.can_send(input) {
            return None;
        }
        let model = self.model.clone();
        let ticket = self.issue_ticket()?;
        let session = self.sessions.get_mut(&ticket.unit_id)?;

        let history: Vec<PromptMessage> = session
            .transcript
            .iter()
            .filter(|m| !m.is_prompt)
            .map(PromptMessage::from)
            .collect();

        append(&mut self.store, session, ChatMessage::user(input));
        session.state = ConversationState::GeneratingReply;
        session.in_flight = Some((ticket, GenerationKind::Reply));

        Some(PendingGeneration {
            ticket,
            kind: GenerationKind::Reply,
            request: GenerationRequest {
                unit: session.unit.clone(),
                messages: history,
                user_message: Some(input.to_string()),
                model,
            },
        })
    }

    /// 生成結果の反映
    ///
    /// チケットの発行元セッションへ反映する。該当リクエストが既に完了済みなら破棄。
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<String, GenerationError>,
    ) -> Completion {
        let Some(session) = self.sessions.get_mut(&ticket.unit_id) else {
            log::warn!("completion for unknown session {}", ticket.unit_id);
            return Completion::Stale;
        };
        let kind = match session.in_flight {
            Some((issued, kind)) if issued == ticket => kind,
            _ => {
                log::debug!("discarding stale response for {}", ticket.unit_id);
                return Completion::Stale;
            }
        };
        session.in_flight = None;

        let failed = outcome.is_err();
        match outcome {
            Ok(text) => {
                if kind == GenerationKind::Initial {
                    let context = build_system_context(&session.unit);
                    append(&mut self.store, session, ChatMessage::system_prompt(context));
                }
                append(&mut self.store, session, ChatMessage::assistant(text));
            }
            Err(e) => {
                log::warn!("generation failed for {}: {}", session.unit.name, e);
                append(&mut self.store, session, ChatMessage::assistant(failure_message(&e)));
            }
        }
        session.state = ConversationState::Idle;

        Completion::Applied {
            unit_id: ticket.unit_id,
            failed,
        }
    }

    /// タイムアウトによる打ち切り（失敗経路へ遷移）
    pub fn expire(&mut self, ticket: Ticket, timeout_secs: u64) -> Completion {
        self.complete(ticket, Err(GenerationError::Timeout(timeout_secs)))
    }

    fn current_session(&self) -> Option<&Session> {
        self.sessions.get(&self.current?)
    }

    fn issue_ticket(&mut self) -> Option<Ticket> {
        let unit_id = self.current?;
        self.next_seq += 1;
        Some(Ticket {
            unit_id,
            seq: self.next_seq,
        })
    }
}

/// 履歴へ追記して即時保存
///
/// 保存失敗は会話を止めずにログへ残す。
fn append<S: TranscriptStore>(store: &mut S, session: &mut Session, message: ChatMessage) {
    session.transcript.push(message);
    if let Err(e) = store.save(session.unit.id, &session.transcript) {
        log::warn!("failed to persist transcript for {}: {}", session.unit.id, e);
    }
}

/// 生成を1件実行して結果を反映
///
/// タイムアウトは呼び出し側で `expire` を使って扱う。
pub async fn run_generation<S, G>(
    manager: &mut ConversationManager<S>,
    generator: &G,
    pending: PendingGeneration,
) -> Completion
where
    S: TranscriptStore,
    G: TextGenerator,
{
    let outcome = generator.generate(&pending.request).await;
    manager.complete(pending.ticket, outcome)
}
