use clap::Parser;
use dialoguer::{Confirm, Select};
use ecobalance::{chat, cli, config, dataset, error, export, generator, session_store};
use ecobalance_common::export::ExportOptions;
use ecobalance_common::map::{legend, marker_color};
use ecobalance_common::panel::{count_label, PanelView};
use ecobalance_common::prompts::is_known_model;
use ecobalance_common::{
    apply_filter, balance_ranking, Classification, ConversationManager, DatasetStore,
    FilterCriteria, Profile, TranscriptStore, ViewMode, DEFAULT_UNIT_NAME,
};
use indicatif::ProgressBar;
use chat::ChatSession;
use cli::{Cli, Commands, SortOrder};
use config::Config;
use error::{EcoBalanceError, Result};
use generator::Generator;
use session_store::FileTranscriptStore;
use std::time::Duration;

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// スピナー付きでデータセットを読み込む
async fn load_dataset(source: &str) -> DatasetStore {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("データセット読み込み中: {}", source));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let store = dataset::load_store(source).await;
    spinner.finish_and_clear();
    store
}

fn find_unit<'a>(store: &'a DatasetStore, name: &str) -> Result<&'a ecobalance_common::Unit> {
    store
        .find_by_name(name)
        .or_else(|| {
            store
                .require_units()
                .ok()
                .and_then(|units| units.iter().find(|u| u.name.eq_ignore_ascii_case(name)))
        })
        .ok_or_else(|| EcoBalanceError::UnitNotFound(name.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;
    let source = cli.dataset.clone().unwrap_or_else(|| config.dataset.clone());

    match cli.command {
        Commands::List { classification, profile, sort, view } => {
            let store = load_dataset(&source).await;
            let units = store.require_units()?;

            let mut criteria = FilterCriteria::new();
            criteria.classifications.extend(classification.into_iter().map(Classification::from));
            criteria.profiles.extend(profile.into_iter().map(Profile::from));

            let mut visible = apply_filter(units, &criteria);
            match sort {
                SortOrder::Dataset => {}
                SortOrder::Balance => visible.sort_by(|a, b| b.balance.total_cmp(&a.balance)),
                SortOrder::Name => visible.sort_by(|a, b| a.name.cmp(&b.name)),
            }

            let mode = ViewMode::from(view);
            println!("🗺  {}  [{}]\n", count_label(visible.len(), units.len()), mode.label());
            for unit in &visible {
                let rank = balance_ranking(units, unit.id).unwrap_or(0);
                let panel = PanelView::build(unit, units);
                println!(
                    "#{:<3} {:<26} {:>22}  {:<14} {:<22} {}",
                    rank,
                    unit.name,
                    panel.balance,
                    unit.classification.as_str(),
                    unit.profile.as_str(),
                    marker_color(mode, unit)
                );
            }

            println!("\n凡例:");
            for (color, label) in legend(mode) {
                println!("  {} {}", color, label);
            }
        }

        Commands::Show { name } => {
            let store = load_dataset(&source).await;
            let units = store.require_units()?;
            let unit = find_unit(&store, &name)?;
            let panel = PanelView::build(unit, units);

            println!("📍 {}\n", panel.name);
            println!("  Balance de Carbono: {}", panel.balance);
            println!("  Clasificación:      {}", panel.classification);
            println!("  Ranking:            {}", panel.ranking);
            println!("  Perfil:             {}", panel.profile);
            println!("  Emisiones Totales:  {}", panel.total_emissions);
            println!("  Captura Bosques:    {}", panel.forest_capture);
            println!("\n  Desglose de Emisiones:");
            for metric in &panel.breakdown {
                println!("    {:<22} {}", metric.label, metric.value);
            }
            println!("\n  Población:          {}", panel.population);
            println!("  Emisiones per cápita: {}", panel.emissions_per_capita);
            println!("  Balance per cápita:   {}", panel.balance_per_capita);

            let sessions = FileTranscriptStore::open(&config.session_dir()?);
            if let Ok(Some(transcript)) = sessions.load(unit.id) {
                println!("\n💬 保存済みの会話: {}件", transcript.iter().filter(|m| !m.is_prompt).count());
            }
        }

        Commands::Chat { name, model } => {
            let store = load_dataset(&source).await;
            let units = store.require_units()?.clone();

            let model = model.unwrap_or_else(|| config.model.clone());
            if !is_known_model(&model) {
                return Err(EcoBalanceError::Config(format!("未対応のモデル: {}", model)));
            }

            let start = match name {
                Some(name) => find_unit(&store, &name)?.name.clone(),
                None => {
                    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
                    let default = names.iter().position(|n| *n == DEFAULT_UNIT_NAME).unwrap_or(0);
                    let index = Select::new()
                        .with_prompt("市町村を選択")
                        .items(&names)
                        .default(default)
                        .interact()?;
                    names[index].to_string()
                }
            };

            let generator = Generator::from_config(cli.ai_provider, &config, cli.verbose)?;
            let sessions = FileTranscriptStore::open(&config.session_dir()?);
            let manager = ConversationManager::new(sessions, model);

            println!("🌱 ecobalance - AI対話 ({:?})", cli.ai_provider);
            ChatSession::new(manager, units, generator, config.timeout_seconds)
                .run(&start)
                .await?;
        }

        Commands::Export { name, output, include_prompt } => {
            let store = load_dataset(&source).await;
            let units = store.require_units()?;
            let unit = find_unit(&store, &name)?;

            let sessions = FileTranscriptStore::open(&config.session_dir()?);
            let transcript = match sessions.load(unit.id) {
                Ok(transcript) => transcript.unwrap_or_default(),
                Err(e) => {
                    log::warn!("stored transcript unreadable: {}", e);
                    Vec::new()
                }
            };
            if transcript.iter().all(|m| m.is_prompt) {
                println!("⚠ {} の会話履歴がありません（`ecobalance chat` で開始）", unit.name);
                return Ok(());
            }

            let output_dir = output.unwrap_or_else(|| std::path::PathBuf::from("."));
            let path = export::write_report(
                &output_dir,
                unit,
                units,
                &transcript,
                ExportOptions { include_prompt },
            )?;
            println!("✔ レポートを保存: {}", path.display());
        }

        Commands::Session { clear, info } => {
            let dir = config.session_dir()?;
            let path = FileTranscriptStore::session_path(&dir);

            if info || !clear {
                // デフォルトまたは--info: 情報表示
                if path.exists() {
                    let sessions = FileTranscriptStore::open(&dir);
                    println!("会話履歴:");
                    println!("  パス: {}", path.display());
                    println!("  市町村数: {}", sessions.len());
                    if let Ok(meta) = std::fs::metadata(&path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("会話履歴ファイルが存在しません: {}", path.display());
                }
            }

            if clear {
                let confirmed = Confirm::new()
                    .with_prompt("全ての会話履歴を削除しますか？")
                    .default(false)
                    .interact()?;
                if confirmed {
                    match FileTranscriptStore::clear(&dir) {
                        Ok(true) => println!("✔ 会話履歴を削除しました: {}", path.display()),
                        Ok(false) => println!("会話履歴ファイルが存在しません"),
                        Err(e) => return Err(EcoBalanceError::SessionStore(e.to_string())),
                    }
                }
            }
        }

        Commands::Config { set_api_key, set_model, set_dataset, set_timeout, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(model) = set_model {
                config.set_model(model)?;
                println!("✔ モデルを設定しました");
            }

            if let Some(dataset) = set_dataset {
                config.dataset = dataset;
                config.save()?;
                println!("✔ データセットを設定しました");
            }

            if let Some(timeout) = set_timeout {
                config.timeout_seconds = timeout;
                config.save()?;
                println!("✔ タイムアウトを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  データセット: {}", config.dataset);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  会話履歴: {}", config.session_dir()?.display());
                println!("  APIキー: {}", if config.api_key.is_some() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
