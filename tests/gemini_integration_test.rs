use ecobalance::generator::GeminiClient;
use ecobalance_common::prompts::DEFAULT_MODEL;
use ecobalance_common::{EmissionBreakdown, GenerationRequest, Unit};

#[tokio::test]
async fn gemini_initial_analysis_integration() {
    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("GEMINI_API_KEY not set; skipping integration test");
            return;
        }
    };

    let unit = Unit {
        id: 68001,
        name: "BUCARAMANGA".to_string(),
        population: 613_400,
        total_emissions: 1_250_000.0,
        forest_capture: 12_000.0,
        balance: 1_238_000.0,
        emissions_per_capita: 2.04,
        balance_per_capita: 2.02,
        classification: "Emisor".into(),
        profile: "Industrial-Urbano".into(),
        index: 85.0,
        cluster: 1,
        latitude: 7.1193,
        longitude: -73.1227,
        emissions: EmissionBreakdown {
            energy: 700_000.0,
            industrial_processes: 200_000.0,
            agriculture: 150_000.0,
            waste: 180_000.0,
            deforestation: 20_000.0,
        },
    };

    let request = GenerationRequest {
        unit,
        messages: vec![],
        user_message: None,
        model: DEFAULT_MODEL.to_string(),
    };

    let analysis = GeminiClient::new(api_key)
        .generate(&request)
        .await
        .expect("gemini api failed");

    assert!(!analysis.trim().is_empty());
}
