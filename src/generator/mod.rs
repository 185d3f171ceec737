mod cli_provider;
mod gemini;

pub use cli_provider::CliGenerator;
pub use gemini::GeminiClient;

use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::Result;
use ecobalance_common::{GenerationError, GenerationRequest, TextGenerator};
use std::future::Future;
use std::time::Duration;

/// 設定から選ばれた生成バックエンド
#[derive(Clone)]
pub enum Generator {
    Api(GeminiClient),
    Cli(CliGenerator),
}

impl Generator {
    pub fn from_config(provider: AiProvider, config: &Config, verbose: bool) -> Result<Self> {
        match CliGenerator::new(provider, verbose) {
            Some(cli) => Ok(Generator::Cli(cli)),
            None => Ok(Generator::Api(GeminiClient::new(config.get_api_key()?))),
        }
    }

    pub async fn run(&self, request: &GenerationRequest) -> std::result::Result<String, GenerationError> {
        match self {
            Generator::Api(client) => client.generate(request).await,
            Generator::Cli(cli) => cli.generate(request).await,
        }
    }

    /// 打ち切り付きで実行
    pub async fn run_with_timeout(
        &self,
        request: &GenerationRequest,
        timeout_secs: u64,
    ) -> std::result::Result<String, GenerationError> {
        with_timeout(self.run(request), timeout_secs).await
    }
}

/// 期限内に終わらなければ `GenerationError::Timeout`
pub async fn with_timeout<F>(work: F, timeout_secs: u64) -> std::result::Result<String, GenerationError>
where
    F: Future<Output = std::result::Result<String, GenerationError>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), work).await {
        Ok(outcome) => outcome,
        Err(_) => Err(GenerationError::Timeout(timeout_secs)),
    }
}

/// 別タスクへ送り出せる生成バックエンド
///
/// 対話セッションはリクエストごとにタスクを起こすため、
/// リクエストを所有した `Send + 'static` な future を返す。
pub trait SpawnGenerator: Clone + Send + Sync + 'static {
    fn spawn_generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = std::result::Result<String, GenerationError>> + Send + 'static;
}

impl SpawnGenerator for Generator {
    fn spawn_generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = std::result::Result<String, GenerationError>> + Send + 'static {
        let generator = self.clone();
        async move { generator.run(&request).await }
    }
}

impl TextGenerator for Generator {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = std::result::Result<String, GenerationError>> {
        self.run(request)
    }
}
