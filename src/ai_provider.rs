use clap::ValueEnum;

/// 生成バックエンド
///
/// `Api` は Gemini REST API を直接呼ぶ。それ以外はローカルCLIをサブプロセスで起動する。
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AiProvider {
    Api,
    Claude,
    Codex,
    Gemini,
}

impl AiProvider {
    /// サブプロセスとして起動するコマンド名
    pub fn command_name(&self) -> Option<&'static str> {
        match self {
            AiProvider::Api => None,
            AiProvider::Claude => Some("claude"),
            AiProvider::Codex => Some("codex"),
            AiProvider::Gemini => Some("gemini"),
        }
    }

    /// プロンプトを渡す引数
    pub fn prompt_args(&self, prompt: &str) -> Vec<String> {
        match self {
            AiProvider::Api => Vec::new(),
            AiProvider::Claude => vec!["-p".into(), prompt.into(), "--output-format".into(), "text".into()],
            AiProvider::Codex => vec!["exec".into(), prompt.into()],
            AiProvider::Gemini => vec!["-p".into(), prompt.into()],
        }
    }
}
