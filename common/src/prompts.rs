//! プロンプト生成モジュール
//!
//! CLIとWeb(WASM)で共有されるプロンプト生成ロジック:
//! - build_system_context: 市町村指標から作るシステム文脈（スペイン語）
//! - build_full_prompt: 生成サービス側で組み立てる最終プロンプト
//! - GEMINI_MODELS / SUGGESTED_QUESTIONS: UIに並べる定数

use crate::error::GenerationError;
use crate::format::{format_fixed, format_number};
use crate::generation::GenerationRequest;
use crate::conversation::Role;
use crate::types::Unit;

/// `toLocaleString` 既定相当の小数桁数
const LOCALE_FRACTION_DIGITS: usize = 3;

/// 選択可能なモデル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub name: &'static str,
    pub free: bool,
}

pub const GEMINI_MODELS: &[ModelOption] = &[
    ModelOption { id: "gemini-2.0-flash-exp", name: "Gemini 2.0 Flash (Experimental)", free: true },
    ModelOption { id: "gemini-1.5-flash", name: "Gemini 1.5 Flash", free: true },
    ModelOption { id: "gemini-1.5-flash-8b", name: "Gemini 1.5 Flash-8B", free: true },
];

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// 生成パラメータ
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 1500;

/// 初回解析の直後に提示する質問候補
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "¿Cuáles son las principales fuentes de emisiones?",
    "Dame 3 recomendaciones para reducir emisiones",
    "¿Cómo se compara con otros municipios?",
    "¿Qué acciones aumentan la captura de carbono?",
];

/// 初回解析の依頼文（ユーザー発話がない場合）
pub const INITIAL_ANALYSIS_REQUEST: &str = "Por favor proporciona:
1. Un análisis breve de la situación actual del municipio (2-3 frases)
2. Las 3 principales fuentes de emisiones y por qué son importantes
3. 3 recomendaciones específicas y accionables para mejorar el balance de carbono del municipio";

pub const SERVICE_ERROR_MESSAGE: &str =
    "Error al generar la respuesta. Por favor, intenta de nuevo.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Error al conectar con el servicio de IA. Por favor, intenta de nuevo.";
pub const TIMEOUT_ERROR_MESSAGE: &str =
    "El servicio de IA tardó demasiado en responder. Por favor, intenta de nuevo.";

pub fn is_known_model(id: &str) -> bool {
    GEMINI_MODELS.iter().any(|m| m.id == id)
}

/// 生成失敗時に会話へ挿入するアシスタントメッセージ
pub fn failure_message(error: &GenerationError) -> &'static str {
    match error {
        GenerationError::Service { .. } | GenerationError::InvalidResponse(_) => SERVICE_ERROR_MESSAGE,
        GenerationError::Network(_) => NETWORK_ERROR_MESSAGE,
        GenerationError::Timeout(_) => TIMEOUT_ERROR_MESSAGE,
    }
}

fn locale(value: f64) -> String {
    format_number(value, LOCALE_FRACTION_DIGITS)
}

/// システム文脈（市町村の指標ブロック）
pub fn build_system_context(unit: &Unit) -> String {
    let e = &unit.emissions;
    format!(
        r#"Eres un experto en análisis ambiental y balance de carbono. Estás conversando sobre el municipio de {name}, Santander, Colombia.

**Datos del Municipio:**
- Población: {population} habitantes
- Balance de Carbono: {balance} ton CO₂eq
- Clasificación: {classification}
- Perfil: {profile}

**Emisiones Totales:** {total} ton CO₂eq
- Energía: {energy} ton
- Agricultura: {agriculture} ton
- Deforestación: {deforestation} ton
- Residuos: {waste} ton
- IPPU (Procesos Industriales): {ippu} ton

**Captura de Carbono:** {capture} ton CO₂eq (por bosques naturales)

**Emisiones per cápita:** {emissions_pc} ton CO₂eq/habitante
**Balance per cápita:** {balance_pc} ton CO₂eq/habitante

Responde en español de forma clara, concisa y profesional. Usa un tono constructivo y orientado a soluciones."#,
        name = unit.name,
        population = locale(unit.population as f64),
        balance = locale(unit.balance),
        classification = unit.classification,
        profile = unit.profile,
        total = locale(unit.total_emissions),
        energy = locale(e.energy),
        agriculture = locale(e.agriculture),
        deforestation = locale(e.deforestation),
        waste = locale(e.waste),
        ippu = locale(e.industrial_processes),
        capture = locale(unit.forest_capture),
        emissions_pc = format_fixed(unit.emissions_per_capita, 2),
        balance_pc = format_fixed(unit.balance_per_capita, 2),
    )
}

/// 生成サービスに渡す最終プロンプト
///
/// 履歴がある場合は「Usuario: / Asistente:」形式で埋め込み、新しい質問を続ける。
pub fn build_full_prompt(request: &GenerationRequest) -> String {
    let context = build_system_context(&request.unit);
    let user_prompt = request
        .user_message
        .as_deref()
        .unwrap_or(INITIAL_ANALYSIS_REQUEST);

    if request.messages.is_empty() {
        return format!("{}\n\n{}", context, user_prompt);
    }

    let history = request
        .messages
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::User => "Usuario",
                _ => "Asistente",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\n**Historial de conversación:**\n{}\n\n**Nueva pregunta del usuario:**\n{}",
        context, history, user_prompt
    )
}
