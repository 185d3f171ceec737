use clap::{Parser, Subcommand, ValueEnum};
use crate::ai_provider::AiProvider;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ecobalance")]
#[command(about = "市町村カーボンバランス探索・AI対話ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ (api/claude/codex/gemini)
    #[arg(long, default_value = "api", global = true)]
    pub ai_provider: AiProvider,

    /// データセット（ファイルパスまたはURL、設定値より優先）
    #[arg(long, global = true)]
    pub dataset: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 市町村一覧（フィルタ付き）
    List {
        /// 区分で絞込み（複数指定はOR）: Sumidero / Equilibrio / Emisor
        #[arg(short, long)]
        classification: Vec<String>,

        /// プロファイルで絞込み（複数指定はOR）
        #[arg(short, long)]
        profile: Vec<String>,

        /// 並び順
        #[arg(short, long, default_value = "dataset")]
        sort: SortOrder,

        /// 地図の配色モード（色コードを表示）
        #[arg(long, default_value = "balance")]
        view: ViewModeArg,
    },

    /// 市町村の詳細
    Show {
        /// 市町村名（例: BUCARAMANGA）
        #[arg(required = true)]
        name: String,
    },

    /// AIとの対話セッション
    Chat {
        /// 市町村名（省略時は一覧から選択）
        name: Option<String>,

        /// 使用モデル（設定値より優先）
        #[arg(short, long)]
        model: Option<String>,
    },

    /// 保存済みの会話をHTMLレポートに出力
    Export {
        /// 市町村名
        #[arg(required = true)]
        name: String,

        /// 出力ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// システム文脈メッセージも含める
        #[arg(long)]
        include_prompt: bool,
    },

    /// 会話履歴の管理
    Session {
        /// 履歴を削除
        #[arg(long)]
        clear: bool,

        /// 履歴情報を表示
        #[arg(long)]
        info: bool,
    },

    /// 設定
    Config {
        /// Gemini APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 既定モデルを設定
        #[arg(long)]
        set_model: Option<String>,

        /// 既定データセットを設定
        #[arg(long)]
        set_dataset: Option<String>,

        /// 生成タイムアウト秒数を設定
        #[arg(long)]
        set_timeout: Option<u64>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortOrder {
    /// データセットの順
    Dataset,
    /// 収支の降順（順位順）
    Balance,
    /// 名前順
    Name,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ViewModeArg {
    Balance,
    Profile,
}

impl From<ViewModeArg> for ecobalance_common::ViewMode {
    fn from(arg: ViewModeArg) -> Self {
        match arg {
            ViewModeArg::Balance => ecobalance_common::ViewMode::Balance,
            ViewModeArg::Profile => ecobalance_common::ViewMode::Profile,
        }
    }
}
