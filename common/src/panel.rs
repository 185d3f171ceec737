//! 詳細パネルとピッカーの表示モデル
//!
//! UIフレームワークに依存せず、文字列化まで済ませた値を返す。

use crate::conversation::{ChatMessage, ConversationState, Role};
use crate::dataset::balance_ranking;
use crate::format::{format_fixed, format_number, format_signed};
use crate::types::Unit;

pub const PICKER_PLACEHOLDER: &str = "Seleccionar municipio...";
pub const PICKER_LOADING: &str = "Cargando municipios...";
pub const PICKER_NO_MATCHES: &str = "No hay municipios con estos filtros";
pub const DATASET_UNAVAILABLE: &str = "No se pudieron cargar los datos.";
pub const GENERATING_STATUS: &str = "Analizando...";

/// 収支の向き（表示色の切替用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceTone {
    /// 正の収支（排出超過）
    Emitting,
    /// 0以下（吸収が上回る）
    Capturing,
}

impl BalanceTone {
    pub fn of(balance: f64) -> Self {
        if balance > 0.0 {
            Self::Emitting
        } else {
            Self::Capturing
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Emitting => "tone-emitting",
            Self::Capturing => "tone-capturing",
        }
    }
}

/// ラベル付きの値
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

impl Metric {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

/// 詳細パネル
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub name: String,
    pub balance: String,
    pub tone: BalanceTone,
    pub classification: String,
    pub profile: String,
    /// "#n de N"
    pub ranking: String,
    pub total_emissions: String,
    pub forest_capture: String,
    pub breakdown: Vec<Metric>,
    pub population: String,
    pub emissions_per_capita: String,
    pub balance_per_capita: String,
}

impl PanelView {
    pub fn build(unit: &Unit, all_units: &[Unit]) -> Self {
        let ranking = balance_ranking(all_units, unit.id)
            .map(|rank| ranking_label(rank, all_units.len()))
            .unwrap_or_else(|| "-".to_string());

        let breakdown = unit
            .emissions
            .entries()
            .into_iter()
            .map(|(source, value)| Metric::new(source.label(), format!("{} ton", format_number(value, 0))))
            .collect();

        Self {
            name: unit.name.clone(),
            balance: format!("{} ton CO₂eq", format_signed(unit.balance, 0)),
            tone: BalanceTone::of(unit.balance),
            classification: unit.classification.label(),
            profile: unit.profile.to_string(),
            ranking,
            total_emissions: format!("{} ton", format_number(unit.total_emissions, 0)),
            forest_capture: format!("{} ton", format_number(unit.forest_capture, 0)),
            breakdown,
            population: format!("{} habitantes", format_number(unit.population as f64, 0)),
            emissions_per_capita: format!("{} ton/hab", format_fixed(unit.emissions_per_capita, 2)),
            balance_per_capita: format!("{} ton/hab", format_fixed(unit.balance_per_capita, 2)),
        }
    }
}

pub fn ranking_label(rank: usize, total: usize) -> String {
    format!("#{} de {}", rank, total)
}

/// "N de M municipios"
pub fn count_label(visible: usize, total: usize) -> String {
    format!("{} de {} municipios", visible, total)
}

/// 質問候補の表示条件: 初回解析直後（プロンプト + 解析の2件のみ）
pub fn show_suggestions(transcript: &[ChatMessage]) -> bool {
    matches!(
        transcript,
        [prompt, analysis] if prompt.is_prompt && analysis.role == Role::Assistant
    )
}

/// 会話ダイアログの状態表示
pub fn status_line(state: ConversationState) -> Option<&'static str> {
    state.is_generating().then_some(GENERATING_STATUS)
}

/// ピッカーの選択肢
#[derive(Debug, Clone, PartialEq)]
pub enum PickerView {
    Loading,
    Unavailable,
    NoMatches,
    Options {
        names: Vec<String>,
        value: Option<String>,
    },
}

impl PickerView {
    /// # Arguments
    /// * `loaded` - データセット読み込み済みか
    /// * `failed` - 読み込みに失敗したか
    /// * `visible` - 絞込み後の市町村
    /// * `value` - ピッカーに表示する選択値（選択がフィルタ外なら `None`）
    pub fn build(loaded: bool, failed: bool, visible: &[&Unit], value: Option<&str>) -> Self {
        if failed {
            return Self::Unavailable;
        }
        if !loaded {
            return Self::Loading;
        }
        if visible.is_empty() {
            return Self::NoMatches;
        }
        Self::Options {
            names: visible.iter().map(|u| u.name.clone()).collect(),
            value: value.map(str::to_string),
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Loading => PICKER_LOADING,
            Self::Unavailable => DATASET_UNAVAILABLE,
            Self::NoMatches => PICKER_NO_MATCHES,
            Self::Options { .. } => PICKER_PLACEHOLDER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_units;
    use crate::filter::{apply_filter, FilterCriteria};
    use crate::types::Classification;

    #[test]
    fn test_panel_view_emitter() {
        let units = sample_units();
        let view = PanelView::build(&units[0], &units);
        assert_eq!(view.name, "BUCARAMANGA");
        assert_eq!(view.balance, "+1.200.000 ton CO₂eq");
        assert_eq!(view.tone, BalanceTone::Emitting);
        assert_eq!(view.ranking, "#1 de 6");
        assert_eq!(view.total_emissions, "1.201.000 ton");
        assert_eq!(view.population, "10.000 habitantes");
        assert_eq!(view.balance_per_capita, "120.00 ton/hab");
        assert_eq!(view.breakdown.len(), 5);
    }

    #[test]
    fn test_panel_view_sink() {
        let units = sample_units();
        let view = PanelView::build(&units[2], &units);
        assert_eq!(view.balance, "-250.000 ton CO₂eq");
        assert_eq!(view.tone, BalanceTone::Capturing);
        assert_eq!(view.ranking, "#6 de 6");
        assert_eq!(view.profile, "Sumideros Forestales");
    }

    #[test]
    fn test_zero_balance_is_capturing() {
        assert_eq!(BalanceTone::of(0.0), BalanceTone::Capturing);
        assert_eq!(BalanceTone::of(0.1), BalanceTone::Emitting);
    }

    #[test]
    fn test_show_suggestions_only_after_initial_analysis() {
        let mut transcript = vec![ChatMessage::system_prompt("ctx"), ChatMessage::assistant("análisis")];
        assert!(show_suggestions(&transcript));

        transcript.push(ChatMessage::user("pregunta"));
        assert!(!show_suggestions(&transcript));

        assert!(!show_suggestions(&[ChatMessage::assistant("error")]));
        assert!(!show_suggestions(&[]));
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(ConversationState::GeneratingReply), Some(GENERATING_STATUS));
        assert_eq!(status_line(ConversationState::Idle), None);
    }

    #[test]
    fn test_picker_view_states() {
        let units = sample_units();
        let all = apply_filter(&units, &FilterCriteria::new());

        assert_eq!(PickerView::build(false, false, &[], None), PickerView::Loading);
        assert_eq!(PickerView::build(false, true, &[], None), PickerView::Unavailable);

        let mut criteria = FilterCriteria::new();
        criteria.toggle_classification(Classification::Other("Desconocido".into()));
        let none = apply_filter(&units, &criteria);
        assert_eq!(PickerView::build(true, false, &none, None), PickerView::NoMatches);

        match PickerView::build(true, false, &all, Some("SAN GIL")) {
            PickerView::Options { names, value } => {
                assert_eq!(names.len(), 6);
                assert_eq!(value.as_deref(), Some("SAN GIL"));
            }
            other => panic!("unexpected picker view: {:?}", other),
        }
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(12, 87), "12 de 87 municipios");
    }
}
