use bidding_ab_core::domain::*;
use pretty_assertions::assert_eq;
use test_case::test_case;
use validator::Validate;

// ===== Defaults =====

#[test]
fn test_analysis_settings_default() {
    let settings = AnalysisSettings::default();

    assert_eq!(settings.metric, Metric::Purchase);
    assert_eq!(settings.alpha, 0.05);
    assert_eq!(settings.levene_center, LeveneCenter::Median);
    assert_eq!(settings.bootstrap_iterations, 0);
    assert_eq!(settings.seed, None);
}

#[test]
fn test_data_settings_default_sheet_names() {
    let data = DataSettings::default();

    assert_eq!(data.control_sheet, "Control Group");
    assert_eq!(data.test_sheet, "Test Group");
    assert_eq!(data.group_column, "Group");
}

#[test]
fn test_default_config_is_valid() {
    assert!(AnalysisConfig::default().validate().is_ok());
}

// ===== Validation =====

#[test_case(0.0 ; "zero")]
#[test_case(1.0 ; "one")]
#[test_case(-0.1 ; "negative")]
#[test_case(1.5 ; "above one")]
fn test_alpha_out_of_range_rejected(alpha: f64) {
    let mut config = AnalysisConfig::default();
    config.analysis.alpha = alpha;

    assert!(config.validate().is_err());
}

#[test]
fn test_outlier_quantiles_must_be_ordered() {
    let mut config = AnalysisConfig::default();
    config.outliers.lower_quantile = 0.9;
    config.outliers.upper_quantile = 0.1;

    let err = config.validated().unwrap_err();
    assert!(matches!(err, bidding_ab_core::CoreError::Validation(_)));
}

#[test]
fn test_empty_sheet_name_rejected() {
    let mut config = AnalysisConfig::default();
    config.data.test_sheet = String::new();

    assert!(config.validate().is_err());
}

// ===== Serialization =====

#[test]
fn test_partial_toml_fills_defaults() {
    let config: AnalysisConfig = toml::from_str(
        r#"
        [analysis]
        metric = "earning"
        alpha = 0.01

        [data]
        control_sheet = "Max Bidding"
        "#,
    )
    .unwrap();

    assert_eq!(config.analysis.metric, Metric::Earning);
    assert_eq!(config.analysis.alpha, 0.01);
    assert_eq!(config.data.control_sheet, "Max Bidding");
    assert_eq!(config.data.test_sheet, "Test Group");
    assert_eq!(config.outliers, OutlierSettings::default());
}

#[test]
fn test_enum_serialization() {
    assert_eq!(serde_json::to_string(&LeveneCenter::Median).unwrap(), "\"median\"");
    assert_eq!(
        serde_json::to_string(&Metric::ConversionRate).unwrap(),
        "\"conversion_rate\""
    );
    assert_eq!(serde_json::to_string(&Group::Test).unwrap(), "\"test\"");
    assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
}

#[test]
fn test_levene_center_parse() {
    assert_eq!("MEAN".parse::<LeveneCenter>().unwrap(), LeveneCenter::Mean);
    assert!("trimmed".parse::<LeveneCenter>().is_err());
}
