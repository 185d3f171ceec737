//! 対話セッション（REPL）
//!
//! 標準入力の行と生成リクエストの完了を同じループで待ち受ける。
//! 生成中でも `/switch` で別の市町村へ移れ、遅れて届いた応答は
//! 発行元の市町村の履歴へ反映される。

use crate::error::{EcoBalanceError, Result};
use crate::export::write_report;
use crate::generator::{with_timeout, SpawnGenerator};
use ecobalance_common::export::{can_export, ExportOptions};
use ecobalance_common::panel::{show_suggestions, PanelView};
use ecobalance_common::prompts::{is_known_model, GEMINI_MODELS, SUGGESTED_QUESTIONS};
use ecobalance_common::{
    ChatMessage, Completion, ConversationManager, ConversationState, GenerationError,
    PendingGeneration, SelectionCoordinator, Ticket, TranscriptStore, Unit,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};

/// 入力行の解釈結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Send(String),
    Suggest(Option<usize>),
    Switch(String),
    Model(Option<String>),
    Export(Option<PathBuf>),
    TogglePrompt,
    History,
    Help,
    Exit,
    Unknown(String),
    Empty,
}

pub fn parse_command(line: &str) -> ChatCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ChatCommand::Send(trimmed.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };

    match name {
        "suggest" => ChatCommand::Suggest(arg.and_then(|a| a.parse().ok())),
        "switch" => match arg {
            Some(unit) => ChatCommand::Switch(unit.to_string()),
            None => ChatCommand::Unknown(trimmed.to_string()),
        },
        "model" => ChatCommand::Model(arg.map(str::to_string)),
        "export" => ChatCommand::Export(arg.map(PathBuf::from)),
        "prompt" => ChatCommand::TogglePrompt,
        "history" => ChatCommand::History,
        "help" => ChatCommand::Help,
        "exit" | "quit" => ChatCommand::Exit,
        _ => ChatCommand::Unknown(trimmed.to_string()),
    }
}

type Outcome = (Ticket, std::result::Result<String, GenerationError>);

pub struct ChatSession<S: TranscriptStore, G: SpawnGenerator> {
    manager: ConversationManager<S>,
    selection: SelectionCoordinator,
    units: Arc<[Unit]>,
    generator: G,
    timeout_secs: u64,
    in_flight: JoinSet<Outcome>,
    tickets: HashMap<tokio::task::Id, Ticket>,
    show_prompt: bool,
    export_dir: PathBuf,
}

impl<S: TranscriptStore, G: SpawnGenerator> ChatSession<S, G> {
    pub fn new(
        manager: ConversationManager<S>,
        units: Arc<[Unit]>,
        generator: G,
        timeout_secs: u64,
    ) -> Self {
        let mut selection = SelectionCoordinator::new();
        selection.on_dataset_loaded(Arc::clone(&units));
        Self {
            manager,
            selection,
            units,
            generator,
            timeout_secs,
            in_flight: JoinSet::new(),
            tickets: HashMap::new(),
            show_prompt: false,
            export_dir: PathBuf::from("."),
        }
    }

    pub async fn run(mut self, start: &str) -> Result<()> {
        if !self.switch_to(start) {
            return Err(EcoBalanceError::UnitNotFound(start.to_string()));
        }
        println!("（/help でコマンド一覧）\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if !self.handle(parse_command(&line)) {
                        break;
                    }
                }
                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    let _ = self.on_joined(joined);
                }
            }
        }

        if !self.in_flight.is_empty() {
            println!("⚠ 応答待ちのリクエスト {}件を破棄して終了します", self.in_flight.len());
        }
        Ok(())
    }

    /// # Returns
    /// ループ継続なら `true`
    fn handle(&mut self, command: ChatCommand) -> bool {
        match command {
            ChatCommand::Empty => {}
            ChatCommand::Send(text) => self.send(&text),
            ChatCommand::Suggest(None) => self.print_suggestions(),
            ChatCommand::Suggest(Some(n)) => match n.checked_sub(1).and_then(|i| SUGGESTED_QUESTIONS.get(i)) {
                Some(question) => {
                    println!("> {}", question);
                    self.send(question);
                }
                None => println!("⚠ 1〜{} の番号を指定してください", SUGGESTED_QUESTIONS.len()),
            },
            ChatCommand::Switch(name) => {
                if !self.switch_to(&name) {
                    println!("⚠ 市町村が見つかりません: {}", name);
                }
            }
            ChatCommand::Model(None) => {
                for model in GEMINI_MODELS {
                    let mark = if model.id == self.manager.model() { "*" } else { " " };
                    println!(" {} {} ({})", mark, model.id, model.name);
                }
            }
            ChatCommand::Model(Some(id)) => {
                if is_known_model(&id) {
                    self.manager.set_model(id.clone());
                    println!("✔ モデルを {} に変更しました", id);
                } else {
                    println!("⚠ 未対応のモデル: {}", id);
                }
            }
            ChatCommand::Export(dir) => self.export(dir),
            ChatCommand::TogglePrompt => {
                self.show_prompt = !self.show_prompt;
                if self.show_prompt {
                    match self.manager.transcript().iter().find(|m| m.is_prompt) {
                        Some(prompt) => print_message(prompt),
                        None => println!("（システム文脈はまだありません）"),
                    }
                } else {
                    println!("（システム文脈を非表示にしました）");
                }
            }
            ChatCommand::History => self.print_history(),
            ChatCommand::Help => print_help(),
            ChatCommand::Exit => return false,
            ChatCommand::Unknown(input) => println!("⚠ 不明なコマンド: {}（/help を参照）", input),
        }
        true
    }

    /// 市町村を切り替えて会話を開く
    fn switch_to(&mut self, name: &str) -> bool {
        let resolved = self
            .units
            .iter()
            .find(|u| u.name == name)
            .or_else(|| self.units.iter().find(|u| u.name.eq_ignore_ascii_case(name)))
            .map(|u| u.name.clone());
        let Some(resolved) = resolved else {
            log::warn!("ignoring selection of unknown unit: {}", name);
            return false;
        };
        let Some(unit) = self.selection.select(&resolved).cloned() else {
            return false;
        };

        let panel = PanelView::build(&unit, &self.units);
        println!("\n📍 {}  {}  ({})", panel.name, panel.balance, panel.ranking);
        println!("   {} / {}", panel.classification, panel.profile);

        let state = self.manager.select_unit(&unit);
        match state {
            ConversationState::Empty => {
                if let Some(pending) = self.manager.open_analysis() {
                    println!("⏳ 初回解析を生成中...");
                    self.dispatch(pending);
                }
            }
            ConversationState::Idle => self.print_history(),
            ConversationState::GeneratingInitial | ConversationState::GeneratingReply => {
                self.print_history();
                println!("⏳ 応答を待っています...");
            }
        }
        true
    }

    fn send(&mut self, text: &str) {
        match self.manager.state() {
            ConversationState::GeneratingInitial | ConversationState::GeneratingReply => {
                println!("⏳ 応答待ちのため送信できません");
                return;
            }
            ConversationState::Empty => {
                println!("⚠ 初回解析がまだありません");
                return;
            }
            ConversationState::Idle => {}
        }
        if let Some(pending) = self.manager.send(text) {
            println!("⏳ 生成中...");
            self.dispatch(pending);
        }
    }

    fn dispatch(&mut self, pending: PendingGeneration) {
        let PendingGeneration { ticket, request, .. } = pending;
        let work = self.generator.spawn_generate(request);
        let timeout_secs = self.timeout_secs;
        let handle = self
            .in_flight
            .spawn(async move { (ticket, with_timeout(work, timeout_secs).await) });
        self.tickets.insert(handle.id(), ticket);
    }

    /// 完了したタスクの結果を発行元の市町村へ反映
    ///
    /// タスクが異常終了した場合も失敗として履歴に残す。
    fn on_joined(
        &mut self,
        joined: std::result::Result<(tokio::task::Id, Outcome), JoinError>,
    ) -> Option<Completion> {
        let (ticket, outcome) = match joined {
            Ok((id, (ticket, outcome))) => {
                self.tickets.remove(&id);
                (ticket, outcome)
            }
            Err(e) => {
                let Some(ticket) = self.tickets.remove(&e.id()) else {
                    log::error!("generation task failed: {}", e);
                    return None;
                };
                (ticket, Err(GenerationError::Network(format!("task failed: {}", e))))
            }
        };

        let completion = self.manager.complete(ticket, outcome);
        match completion {
            Completion::Applied { unit_id, .. } => {
                let is_current = self.manager.current_unit().is_some_and(|u| u.id == unit_id);
                if is_current {
                    if let Some(last) = self.manager.transcript().last() {
                        print_message(last);
                    }
                    if show_suggestions(self.manager.transcript()) {
                        self.print_suggestions();
                    }
                } else {
                    let name = self
                        .units
                        .iter()
                        .find(|u| u.id == unit_id)
                        .map(|u| u.name.as_str())
                        .unwrap_or("?");
                    println!("\n💬 {} の応答を受信しました（/switch {} で表示）", name, name);
                }
            }
            Completion::Stale => log::debug!("stale completion ignored"),
        }
        Some(completion)
    }

    fn export(&mut self, dir: Option<PathBuf>) {
        let Some(unit) = self.manager.current_unit().cloned() else {
            return;
        };
        let transcript = self.manager.transcript();
        if !can_export(transcript) {
            println!("⚠ 出力する会話がありません");
            return;
        }
        let dir = dir.unwrap_or_else(|| self.export_dir.clone());
        let options = ExportOptions { include_prompt: self.show_prompt };
        match write_report(&dir, &unit, &self.units, transcript, options) {
            Ok(path) => {
                println!("✔ レポートを保存: {}", path.display());
                self.export_dir = dir;
            }
            Err(e) => println!("⚠ エクスポート失敗: {}", e),
        }
    }

    fn print_history(&self) {
        for message in self.manager.transcript() {
            if message.is_prompt && !self.show_prompt {
                continue;
            }
            print_message(message);
        }
    }

    fn print_suggestions(&self) {
        println!("\n💡 質問候補（/suggest <番号> で送信）:");
        for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
            println!("  {}. {}", i + 1, question);
        }
    }
}

fn print_message(message: &ChatMessage) {
    println!(
        "\n[{}] {}\n{}",
        message.role.label(),
        message.timestamp.format("%H:%M"),
        message.content
    );
}

fn print_help() {
    println!("コマンド:");
    println!("  <テキスト>         質問を送信");
    println!("  /suggest [番号]    質問候補の表示・送信");
    println!("  /switch <市町村>   市町村を切り替え");
    println!("  /model [ID]        モデルの表示・変更");
    println!("  /export [DIR]      HTMLレポートを出力");
    println!("  /prompt            システム文脈の表示切替");
    println!("  /history           会話履歴を表示");
    println!("  /exit              終了");
}
