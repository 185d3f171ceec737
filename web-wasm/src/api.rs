//! HTTPアクセス（データセット取得・生成サービス呼び出し）

use crate::config::{ANALYSIS_ENDPOINT, DATASET_URL};
use ecobalance_common::generation::interpret_response;
use ecobalance_common::{parse_units, GenerationError, GenerationRequest, TextGenerator, Unit};
use futures::future::{select, Either};
use gloo::timers::future::TimeoutFuture;
use std::pin::pin;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// fetch 呼び出し（共通処理）
///
/// ステータスに関わらず本文を返す。解釈は呼び出し側で行う。
async fn fetch_text(url: &str, method: &str, body: Option<&str>) -> Result<(u16, String), JsValue> {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::SameOrigin);
    if let Some(body) = body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(url, &opts)?;
    if body.is_some() {
        request.headers().set("Content-Type", "application/json")?;
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window not available"))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
    let resp: Response = resp_value.dyn_into()?;

    let text = JsFuture::from(resp.text()?).await?;
    Ok((resp.status(), text.as_string().unwrap_or_default()))
}

/// データセット取得
pub async fn fetch_dataset() -> ecobalance_common::Result<Vec<Unit>> {
    let (status, body) = fetch_text(DATASET_URL, "GET", None)
        .await
        .map_err(|e| ecobalance_common::Error::DatasetUnavailable(format!("{:?}", e)))?;

    if !(200..300).contains(&status) {
        return Err(ecobalance_common::Error::DatasetUnavailable(format!(
            "{} returned HTTP {}",
            DATASET_URL, status
        )));
    }
    parse_units(&body)
}

/// 生成サービス（`POST /api/ai-analysis`）
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpGenerator;

impl TextGenerator for HttpGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = serde_json::to_string(request)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let (status, text) = fetch_text(ANALYSIS_ENDPOINT, "POST", Some(&body))
            .await
            .map_err(|e| GenerationError::Network(format!("{:?}", e)))?;

        interpret_response(status, &text)
    }
}

/// 打ち切り付きで生成
///
/// 期限切れ後に届いた応答は破棄される（future ごと drop）。
pub async fn generate_with_timeout<G: TextGenerator>(
    generator: &G,
    request: &GenerationRequest,
    timeout_secs: u64,
) -> Result<String, GenerationError> {
    let millis = u32::try_from(timeout_secs.saturating_mul(1000)).unwrap_or(u32::MAX);
    let work = pin!(generator.generate(request));
    let timer = pin!(TimeoutFuture::new(millis));

    match select(work, timer).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(_) => {
            log::warn!("generation for {} timed out after {}s", request.unit.name, timeout_secs);
            Err(GenerationError::Timeout(timeout_secs))
        }
    }
}
