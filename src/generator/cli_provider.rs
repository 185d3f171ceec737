//! ローカルAI CLI連携
//!
//! claude / codex / gemini のCLIをサブプロセスとして起動し、標準出力を応答とする。
//! モデル指定はCLI側の設定に従う。

use crate::ai_provider::AiProvider;
use ecobalance_common::prompts::build_full_prompt;
use ecobalance_common::{GenerationError, GenerationRequest};
use tokio::process::Command;

#[derive(Clone, Debug)]
pub struct CliGenerator {
    provider: AiProvider,
    verbose: bool,
}

impl CliGenerator {
    /// # Returns
    /// `AiProvider::Api` はサブプロセスを持たないため `None`
    pub fn new(provider: AiProvider, verbose: bool) -> Option<Self> {
        provider.command_name()?;
        Some(Self { provider, verbose })
    }

    fn command(&self, prompt: &str) -> Command {
        let name = self.provider.command_name().unwrap_or("claude");
        let args = self.provider.prompt_args(prompt);

        // Windowsではcmd /c経由
        #[cfg(windows)]
        let mut command = {
            let mut c = Command::new("cmd");
            c.arg("/c").arg(name).args(&args);
            c
        };

        #[cfg(not(windows))]
        let mut command = {
            let mut c = Command::new(name);
            c.args(&args);
            c
        };

        // タイムアウトで打ち切られたらプロセスも終了させる
        command.kill_on_drop(true);
        command
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let prompt = build_full_prompt(request);
        let name = self.provider.command_name().unwrap_or("claude");

        if self.verbose {
            println!("  [{}] プロンプト長: {} chars", name, prompt.len());
        }

        let output = self
            .command(&prompt)
            .output()
            .await
            .map_err(|e| GenerationError::Network(format!("{} CLI実行エラー: {}", name, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::Service {
                status: 500,
                error: format!("{} CLI failed (code {:?})", name, output.status.code()),
                details: stderr.trim().to_string(),
            });
        }

        let response = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if response.is_empty() {
            return Err(GenerationError::InvalidResponse(format!("{} CLI returned no output", name)));
        }

        if self.verbose {
            let preview: String = response.chars().take(500).collect();
            println!("  レスポンス: {}", preview);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_provider_has_no_subprocess() {
        assert!(CliGenerator::new(AiProvider::Api, false).is_none());
        assert!(CliGenerator::new(AiProvider::Codex, false).is_some());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_command_program_and_args() {
        let generator = CliGenerator::new(AiProvider::Claude, false).expect("CLIプロバイダ");
        let command = generator.command("hola");
        let std_command = command.as_std();
        assert_eq!(std_command.get_program(), "claude");
        let args: Vec<_> = std_command.get_args().collect();
        assert_eq!(args, vec!["-p", "hola", "--output-format", "text"]);
    }
}
