//! データセット読み込み
//!
//! ファイルパスまたは http(s) URL から市町村JSONを1回だけ読み込む。
//! 失敗は `LoadState::Failed` として保持し、自動リトライはしない。

use crate::error::{EcoBalanceError, Result};
use ecobalance_common::{parse_units, DatasetStore, Error as CommonError, Unit};

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn fetch_text(source: &str) -> Result<String> {
    if is_remote(source) {
        let response = reqwest::get(source)
            .await
            .map_err(|e| EcoBalanceError::DatasetLoad(format!("{}: {}", source, e)))?;
        let response = response
            .error_for_status()
            .map_err(|e| EcoBalanceError::DatasetLoad(format!("{}: {}", source, e)))?;
        response
            .text()
            .await
            .map_err(|e| EcoBalanceError::DatasetLoad(format!("{}: {}", source, e)))
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| EcoBalanceError::DatasetLoad(format!("{}: {}", source, e)))
    }
}

pub async fn load_units(source: &str) -> Result<Vec<Unit>> {
    let raw = fetch_text(source).await?;
    let units = parse_units(&raw)?;
    log::info!("loaded {} units from {}", units.len(), source);
    Ok(units)
}

/// 読み込み結果を反映したストア
pub async fn load_store(source: &str) -> DatasetStore {
    let mut store = DatasetStore::new();
    let result = load_units(source)
        .await
        .map_err(|e| CommonError::DatasetUnavailable(e.to_string()));
    if let Err(e) = &result {
        log::error!("dataset load failed: {}", e);
    }
    store.finish(result);
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecobalance_common::LoadState;
    use tempfile::tempdir;

    const ONE_UNIT: &str = r#"[{
        "codMunicipio": 68001, "municipio": "BUCARAMANGA", "totalPoblacion": 613400,
        "emisionesTotales": 1000.0, "capturaBosques": 10.0, "balanceCarbono": 990.0,
        "emisionesPerCapita": 0.1, "balancePerCapita": 0.1,
        "clasificacion": "Emisor", "perfil": "Industrial-Urbano", "IEC": 80.0, "cluster": 1,
        "latitud": 7.12, "longitud": -73.12,
        "emisionesEnergia": 500.0, "emisionesIPPU": 100.0, "emisionesAgricultura": 200.0,
        "emisionesResiduos": 150.0, "emisionesDeforestacion": 50.0
    }]"#;

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("santander-data.json");
        std::fs::write(&path, ONE_UNIT).expect("書き込み失敗");

        let store = load_store(&path.display().to_string()).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_name("BUCARAMANGA").map(|u| u.population), Some(613400));
    }

    #[tokio::test]
    async fn test_missing_file_is_failed_state() {
        let store = load_store("/nonexistent/santander-data.json").await;
        assert!(matches!(store.state(), LoadState::Failed(_)));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/data.json"));
        assert!(!is_remote("data/santander-data.json"));
    }
}
