//! 市町村データの型定義
//!
//! データセットJSON（`santander-data.json`）のレコードをそのまま受ける:
//! - Unit: 1市町村分の炭素収支指標
//! - Classification: 収支区分（Sumidero / Equilibrio / Emisor）
//! - Profile: クラスタリングによる排出構造ラベル
//! - EmissionBreakdown: 排出源5区分の内訳

use serde::{Deserialize, Serialize};
use std::fmt;

/// 市町村コード（codMunicipio）
pub type UnitId = u32;

/// 収支区分
///
/// 未知のタグは `Other` として保持し、地図ではフォールバック色になる。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Classification {
    Sumidero,
    Equilibrio,
    Emisor,
    Other(String),
}

impl Classification {
    /// フィルタUIに並べる既知の区分
    pub const ALL: [Classification; 3] = [
        Classification::Sumidero,
        Classification::Equilibrio,
        Classification::Emisor,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Classification::Sumidero => "Sumidero",
            Classification::Equilibrio => "Equilibrio",
            Classification::Emisor => "Emisor",
            Classification::Other(tag) => tag,
        }
    }

    /// 詳細パネル表示用ラベル（絵文字付き）
    pub fn label(&self) -> String {
        match self {
            Classification::Sumidero => "🌲 Sumidero".to_string(),
            Classification::Equilibrio => "⚖️ Equilibrio".to_string(),
            Classification::Emisor => "🏭 Emisor".to_string(),
            Classification::Other(tag) => tag.clone(),
        }
    }
}

impl From<String> for Classification {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Sumidero" => Classification::Sumidero,
            "Equilibrio" => Classification::Equilibrio,
            "Emisor" => Classification::Emisor,
            _ => Classification::Other(value),
        }
    }
}

impl From<&str> for Classification {
    fn from(value: &str) -> Self {
        Classification::from(value.to_string())
    }
}

impl From<Classification> for String {
    fn from(value: Classification) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 排出構造プロファイル（クラスタラベル）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Profile {
    AgriculturalLivestock,
    IndustrialUrban,
    MixedTransition,
    ForestSinks,
    Other(String),
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::AgriculturalLivestock,
        Profile::IndustrialUrban,
        Profile::MixedTransition,
        Profile::ForestSinks,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Profile::AgriculturalLivestock => "Agrícola-Ganadero",
            Profile::IndustrialUrban => "Industrial-Urbano",
            Profile::MixedTransition => "Mixto-Transición",
            Profile::ForestSinks => "Sumideros Forestales",
            Profile::Other(tag) => tag,
        }
    }
}

impl From<String> for Profile {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Agrícola-Ganadero" => Profile::AgriculturalLivestock,
            "Industrial-Urbano" => Profile::IndustrialUrban,
            "Mixto-Transición" => Profile::MixedTransition,
            "Sumideros Forestales" => Profile::ForestSinks,
            _ => Profile::Other(value),
        }
    }
}

impl From<&str> for Profile {
    fn from(value: &str) -> Self {
        Profile::from(value.to_string())
    }
}

impl From<Profile> for String {
    fn from(value: Profile) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 排出源区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmissionSource {
    Energy,
    IndustrialProcesses,
    Agriculture,
    Waste,
    Deforestation,
}

impl EmissionSource {
    pub fn label(&self) -> &'static str {
        match self {
            EmissionSource::Energy => "Energía",
            EmissionSource::IndustrialProcesses => "IPPU (Procesos Industriales)",
            EmissionSource::Agriculture => "Agricultura",
            EmissionSource::Waste => "Residuos",
            EmissionSource::Deforestation => "Deforestación",
        }
    }
}

/// 排出源別の排出量（ton CO₂eq）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionBreakdown {
    #[serde(rename = "emisionesEnergia")]
    pub energy: f64,
    #[serde(rename = "emisionesIPPU")]
    pub industrial_processes: f64,
    #[serde(rename = "emisionesAgricultura")]
    pub agriculture: f64,
    #[serde(rename = "emisionesResiduos")]
    pub waste: f64,
    #[serde(rename = "emisionesDeforestacion")]
    pub deforestation: f64,
}

impl EmissionBreakdown {
    /// 表示順（エネルギー → 農業 → 森林破壊 → 廃棄物 → IPPU）
    pub fn entries(&self) -> [(EmissionSource, f64); 5] {
        [
            (EmissionSource::Energy, self.energy),
            (EmissionSource::Agriculture, self.agriculture),
            (EmissionSource::Deforestation, self.deforestation),
            (EmissionSource::Waste, self.waste),
            (EmissionSource::IndustrialProcesses, self.industrial_processes),
        ]
    }
}

/// 市町村レコード
///
/// 読み込み後は不変。DatasetStore が所有し、他は参照のみ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(rename = "codMunicipio")]
    pub id: UnitId,

    #[serde(rename = "municipio")]
    pub name: String,

    #[serde(rename = "totalPoblacion")]
    pub population: u64,

    #[serde(rename = "emisionesTotales")]
    pub total_emissions: f64,

    #[serde(rename = "capturaBosques")]
    pub forest_capture: f64,

    #[serde(rename = "balanceCarbono")]
    pub balance: f64,

    #[serde(rename = "emisionesPerCapita")]
    pub emissions_per_capita: f64,

    #[serde(rename = "balancePerCapita")]
    pub balance_per_capita: f64,

    #[serde(rename = "clasificacion")]
    pub classification: Classification,

    #[serde(rename = "perfil")]
    pub profile: Profile,

    /// 正規化指標 IEC（0-100）
    #[serde(rename = "IEC", default)]
    pub index: f64,

    #[serde(default)]
    pub cluster: i32,

    #[serde(rename = "latitud")]
    pub latitude: f64,

    #[serde(rename = "longitud")]
    pub longitude: f64,

    #[serde(flatten)]
    pub emissions: EmissionBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "codMunicipio": 68001,
        "municipio": "BUCARAMANGA",
        "totalPoblacion": 613400,
        "emisionesTotales": 1250000.5,
        "capturaBosques": 12000.0,
        "balanceCarbono": 1238000.5,
        "emisionesPerCapita": 2.04,
        "balancePerCapita": 2.02,
        "clasificacion": "Emisor",
        "perfil": "Industrial-Urbano",
        "latitud": 7.1193,
        "longitud": -73.1227,
        "emisionesEnergia": 800000.0,
        "emisionesIPPU": 150000.0,
        "emisionesAgricultura": 50000.0,
        "emisionesResiduos": 240000.5,
        "emisionesDeforestacion": 10000.0,
        "IEC": 97.5,
        "cluster": 1
    }"#;

    #[test]
    fn test_unit_deserialize() {
        let unit: Unit = serde_json::from_str(SAMPLE).expect("デシリアライズ失敗");
        assert_eq!(unit.id, 68001);
        assert_eq!(unit.name, "BUCARAMANGA");
        assert_eq!(unit.classification, Classification::Emisor);
        assert_eq!(unit.profile, Profile::IndustrialUrban);
        assert_eq!(unit.emissions.industrial_processes, 150000.0);
        assert_eq!(unit.index, 97.5);
    }

    #[test]
    fn test_unit_serialize_keeps_dataset_field_names() {
        let unit: Unit = serde_json::from_str(SAMPLE).expect("デシリアライズ失敗");
        let json = serde_json::to_string(&unit).expect("シリアライズ失敗");
        assert!(json.contains("\"codMunicipio\":68001"));
        assert!(json.contains("\"clasificacion\":\"Emisor\""));
        assert!(json.contains("\"perfil\":\"Industrial-Urbano\""));
        assert!(json.contains("\"emisionesDeforestacion\":10000.0"));
    }

    #[test]
    fn test_unknown_tags_are_preserved() {
        let json = SAMPLE
            .replace("\"Emisor\"", "\"Neutro\"")
            .replace("\"Industrial-Urbano\"", "\"Minero\"");
        let unit: Unit = serde_json::from_str(&json).expect("デシリアライズ失敗");
        assert_eq!(unit.classification, Classification::Other("Neutro".to_string()));
        assert_eq!(unit.profile.as_str(), "Minero");
    }

    #[test]
    fn test_missing_index_and_cluster_default() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE).expect("JSON不正");
        let map = value.as_object_mut().expect("オブジェクトではない");
        map.remove("IEC");
        map.remove("cluster");
        let unit: Unit = serde_json::from_value(value).expect("デシリアライズ失敗");
        assert_eq!(unit.index, 0.0);
        assert_eq!(unit.cluster, 0);
    }

    #[test]
    fn test_classification_label() {
        assert_eq!(Classification::Sumidero.label(), "🌲 Sumidero");
        assert_eq!(Classification::from("Otro").label(), "Otro");
    }

    #[test]
    fn test_breakdown_entries_cover_five_sources() {
        let unit: Unit = serde_json::from_str(SAMPLE).expect("デシリアライズ失敗");
        let entries = unit.emissions.entries();
        assert_eq!(entries.len(), 5);
        let total: f64 = entries.iter().map(|(_, v)| v).sum();
        assert_eq!(total, unit.total_emissions);
    }
}
