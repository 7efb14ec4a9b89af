use kidz_dialogue::PolicyConfig;
use kidz_intent::MatcherConfig;
use kidz_kb::SearchConfig;
use kidz_session::SessionConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Everything the binary reads from the environment. Secrets stay in env
/// vars; tunables come from an optional JSON file and fall back to the
/// reference defaults.
#[derive(Debug)]
pub struct BotConfig {
    pub bind_addr: String,
    pub verify_token: Option<String>,
    pub page_access_token: Option<String>,
    pub intents_path: PathBuf,
    pub products_path: PathBuf,
    pub kb_index_path: PathBuf,
    pub tuning: Tuning,
}

/// Tunable thresholds and vocabularies, deserializable as one document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub matcher: MatcherConfig,
    pub search: SearchConfig,
    pub session: SessionConfig,
    pub policy: PolicyConfig,
}

impl BotConfig {
    /// Never fails: missing secrets leave the corresponding `Option` empty
    /// and the caller runs the affected component in degraded mode.
    pub fn from_env() -> Self {
        let tuning = match std::env::var("BOT_CONFIG_PATH") {
            Ok(path) => match std::fs::read(&path) {
                Ok(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(tuning) => tuning,
                    Err(err) => {
                        log::warn!("Invalid tuning file {path}: {err}; using defaults");
                        Tuning::default()
                    }
                },
                Err(err) => {
                    log::warn!("Cannot read tuning file {path}: {err}; using defaults");
                    Tuning::default()
                }
            },
            Err(_) => Tuning::default(),
        };

        let missing_warn = |name: &str| {
            log::error!("{name} is not set; running in degraded mode");
        };
        let verify_token = std::env::var("VERIFY_TOKEN").ok();
        if verify_token.is_none() {
            missing_warn("VERIFY_TOKEN");
        }
        let page_access_token = std::env::var("PAGE_ACCESS_TOKEN").ok();
        if page_access_token.is_none() {
            missing_warn("PAGE_ACCESS_TOKEN");
        }

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            verify_token,
            page_access_token,
            intents_path: path_var("INTENTS_PATH", "data/intents.json"),
            products_path: path_var("PRODUCTS_PATH", "data/products.json"),
            kb_index_path: path_var("KB_INDEX_PATH", "data/kb_index.json"),
            tuning,
        }
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name).map_or_else(|_| PathBuf::from(default), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tuning_defaults_match_reference_constants() {
        let tuning = Tuning::default();
        assert!((tuning.matcher.threshold - 0.34).abs() < f64::EPSILON);
        assert_eq!(tuning.session.max_asks, 2);
        assert_eq!(tuning.session.max_history, 6);
        assert_eq!(tuning.search.top_k, 5);
    }

    #[test]
    fn tuning_file_overrides_selected_fields() {
        let json = r#"{
            "matcher": { "threshold": 0.3, "require_keyword_hit": true },
            "session": { "max_asks": 1 }
        }"#;
        let tuning: Tuning = serde_json::from_str(json).unwrap();
        assert!(tuning.matcher.require_keyword_hit);
        assert_eq!(tuning.session.max_asks, 1);
        // Untouched sections keep their defaults.
        assert_eq!(tuning.search.top_k, 5);
    }
}
