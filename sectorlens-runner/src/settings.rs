//! Run settings loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sectorlens_core::config::{AnalysisConfig, ConfigError};
use sectorlens_core::domain::{HistoryPeriod, Interval};
use sectorlens_core::MIN_DATA_POINTS;

use crate::cache::DEFAULT_TTL;
use crate::provider::FetchRequest;
use crate::universe::Universe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniverseKind {
    #[default]
    Sectors,
    Etfs,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Directory of `{symbol}.csv` files.
    pub data_dir: PathBuf,
    pub universe: UniverseKind,
    /// Required when `universe = "custom"`.
    pub custom_universe: Option<Universe>,
    /// Bar granularity. Overrides `analysis.interval`.
    pub interval: Interval,
    pub period: HistoryPeriod,
    /// Last day of data to use; today when unset.
    pub end_date: Option<NaiveDate>,
    pub min_data_points: usize,
    pub fetch_workers: usize,
    pub fetch_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub analysis: AnalysisConfig,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            universe: UniverseKind::Sectors,
            custom_universe: None,
            interval: Interval::Daily,
            period: HistoryPeriod::OneYear,
            end_date: None,
            min_data_points: MIN_DATA_POINTS,
            fetch_workers: 8,
            fetch_timeout_secs: 30,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl RunSettings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: RunSettings =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis_config().validate()?;
        if self.universe == UniverseKind::Custom && self.custom_universe.is_none() {
            return Err(ConfigError::Parse(
                "universe = \"custom\" requires a [custom_universe] table".into(),
            ));
        }
        if self.fetch_workers == 0 {
            return Err(ConfigError::OutOfRange {
                name: "fetch_workers",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Analysis config with the run's interval applied.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            interval: self.interval,
            ..self.analysis.clone()
        }
    }

    pub fn resolve_universe(&self) -> Result<Universe, ConfigError> {
        match self.universe {
            UniverseKind::Sectors => Ok(Universe::nse_sectors()),
            UniverseKind::Etfs => Ok(Universe::sector_etfs()),
            UniverseKind::Custom => self
                .custom_universe
                .clone()
                .ok_or_else(|| ConfigError::Parse("missing [custom_universe] table".into())),
        }
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            interval: self.interval,
            period: self.period,
            end: self.end_date(),
            min_data_points: self.min_data_points,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let settings = RunSettings::from_toml("").unwrap();
        assert_eq!(settings, RunSettings::default());
        assert_eq!(settings.fetch_workers, 8);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn parses_nested_analysis_section() {
        let settings = RunSettings::from_toml(
            r#"
            universe = "etfs"
            interval = "weekly"
            period = "2y"
            end_date = "2024-06-28"

            [analysis.momentum_weights]
            ADX_Z = 25.0
            RS_Rating = 35.0
            RSI = 30.0
            DI_Spread = 10.0

            [analysis.reversal_thresholds]
            RSI = 35.0
            ADX_Z = -1.0
            "#,
        )
        .unwrap();

        assert_eq!(settings.universe, UniverseKind::Etfs);
        assert_eq!(settings.period, HistoryPeriod::TwoYears);
        let config = settings.analysis_config();
        assert_eq!(config.interval, Interval::Weekly);
        assert_eq!(config.momentum_weights.adx_z, 25.0);
        assert_eq!(config.reversal_thresholds.map(|t| t.rsi), Some(35.0));
        assert_eq!(
            settings.fetch_request().end,
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
        );
    }

    #[test]
    fn custom_universe_required() {
        let err = RunSettings::from_toml(r#"universe = "custom""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let settings = RunSettings::from_toml(
            r#"
            universe = "custom"
            [custom_universe.benchmark]
            name = "Index"
            symbol = "IDX"
            [[custom_universe.members]]
            name = "Alpha"
            symbol = "AAA"
            alternate = "AAA.ALT"
            "#,
        )
        .unwrap();
        let universe = settings.resolve_universe().unwrap();
        assert_eq!(universe.members[0].alternate.as_deref(), Some("AAA.ALT"));
    }

    #[test]
    fn invalid_weights_rejected() {
        let err = RunSettings::from_toml(
            r#"
            [analysis.reversal_weights]
            RS_Rating = 0.0
            CMF = 0.0
            RSI = 0.0
            ADX_Z = 0.0
            "#,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::ZeroWeightSum { config: "reversal" });
    }

    #[test]
    fn zero_workers_rejected() {
        let err = RunSettings::from_toml("fetch_workers = 0").unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                name: "fetch_workers",
                value: 0.0
            }
        );
    }

    #[test]
    fn partial_weights_in_toml() {
        let settings = RunSettings::from_toml(
            r#"
            [analysis.reversal_weights]
            CMF = 30.0
            "#,
        )
        .unwrap();
        let weights = settings.analysis_config().reversal_weights;
        assert_eq!(weights.cmf, 30.0);
        assert_eq!(weights.rs_rating, 40.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunSettings::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
