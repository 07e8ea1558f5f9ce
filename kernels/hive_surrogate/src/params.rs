// Uncertain-parameter configuration parsing
//
// The UQ campaign config enumerates, per simulation app, the physical
// parameters that were varied when the training snapshots were generated.
// Each parameter carries a human-readable label and a prior distribution;
// the label and the prior's support become the input bound presented to the
// user. Parameter ordering in the file is the ordering the regressor was
// trained with, so it is preserved end to end.
//
// Only uniform priors are supported: their support is exactly
// [loc, loc + scale]. Any other distribution has no closed interval to
// offer as a bound, so parsing aborts - no partial parameter list is ever
// returned.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::SurrogateError;

// ============================================================================
// CONFIG FILE LAYOUT
// ============================================================================

#[derive(Debug, Deserialize)]
struct ConfigFile {
    // App name -> app config, in file order
    apps: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct AppConfig {
    // App kind; only "moose" apps carry the thermal parameters we scan
    #[serde(rename = "type")]
    kind: String,

    // Group name -> (parameter name -> parameter config)
    #[serde(rename = "uncertain-params", default)]
    uncertain_params: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UncertainParam {
    #[serde(rename = "human-description")]
    human_description: String,

    distribution: Distribution,
}

#[derive(Debug, Deserialize)]
struct Distribution {
    name: String,
    loc: f64,
    scale: f64,
}

// ============================================================================
// PARSED OUTPUT
// ============================================================================

// One uncertain parameter, ready to seed a UI input bound
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    // Human-readable label from the config
    pub label: String,

    // Uniform prior support [min, max] = [loc, loc + scale]
    pub min: f64,
    pub max: f64,
}

impl ParameterSpec {
    // Default input value: centre of the prior support
    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

// Parse the config file into an ordered parameter list
pub fn parse_parameters(path: impl AsRef<Path>) -> Result<Vec<ParameterSpec>, SurrogateError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| SurrogateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_parameters_str(&raw).map_err(|e| match e {
        SurrogateError::Json { source, .. } => SurrogateError::Json {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

// Parse from an in-memory config string
pub fn parse_parameters_str(raw: &str) -> Result<Vec<ParameterSpec>, SurrogateError> {
    let config: ConfigFile = serde_json::from_str(raw).map_err(|source| SurrogateError::Json {
        path: "<config>".into(),
        source,
    })?;

    let mut specs = Vec::new();
    for (app_name, app_value) in &config.apps {
        let app: AppConfig =
            serde_json::from_value(app_value.clone()).map_err(|source| SurrogateError::Json {
                path: format!("<config:apps.{app_name}>").into(),
                source,
            })?;

        // Other app kinds (e.g. "json" sampler configs) carry no thermal
        // parameters and are skipped
        if app.kind != "moose" {
            continue;
        }

        for (group_name, group_value) in &app.uncertain_params {
            let group: Map<String, Value> = serde_json::from_value(group_value.clone()).map_err(
                |source| SurrogateError::Json {
                    path: format!("<config:{group_name}>").into(),
                    source,
                },
            )?;

            for (param_name, param_value) in &group {
                let param: UncertainParam = serde_json::from_value(param_value.clone()).map_err(
                    |source| SurrogateError::Json {
                        path: format!("<config:{group_name}.{param_name}>").into(),
                        source,
                    },
                )?;

                if param.distribution.name != "uniform" {
                    return Err(SurrogateError::UnsupportedDistribution {
                        parameter: param_name.clone(),
                        distribution: param.distribution.name,
                    });
                }

                specs.push(ParameterSpec {
                    label: param.human_description,
                    min: param.distribution.loc,
                    max: param.distribution.loc + param.distribution.scale,
                });
            }
        }
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_CONFIG: &str = r#"{
        "apps": {
            "thermal": {
                "type": "moose",
                "uncertain-params": {
                    "BCs": {
                        "coolant_temp": {
                            "human-description": "Coolant temperature [K]",
                            "distribution": {"name": "uniform", "loc": 140.0, "scale": 40.0}
                        },
                        "htc": {
                            "human-description": "Heat transfer coefficient",
                            "distribution": {"name": "uniform", "loc": 0.5, "scale": 1.0}
                        }
                    },
                    "Materials": {
                        "conductivity": {
                            "human-description": "Thermal conductivity scaling",
                            "distribution": {"name": "uniform", "loc": 0.9, "scale": 0.2}
                        }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_ordered_parameters() {
        let specs = parse_parameters_str(GOOD_CONFIG).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].label, "Coolant temperature [K]");
        assert_eq!(specs[0].min, 140.0);
        assert_eq!(specs[0].max, 180.0);
        assert_eq!(specs[1].label, "Heat transfer coefficient");
        assert_eq!(specs[2].label, "Thermal conductivity scaling");
    }

    #[test]
    fn test_midpoint() {
        let spec = ParameterSpec {
            label: "x".to_string(),
            min: 140.0,
            max: 180.0,
        };
        assert_eq!(spec.midpoint(), 160.0);
    }

    #[test]
    fn test_non_uniform_prior_rejected() {
        let config = r#"{
            "apps": {
                "thermal": {
                    "type": "moose",
                    "uncertain-params": {
                        "BCs": {
                            "coolant_temp": {
                                "human-description": "Coolant temperature [K]",
                                "distribution": {"name": "normal", "loc": 150.0, "scale": 10.0}
                            }
                        }
                    }
                }
            }
        }"#;
        let result = parse_parameters_str(config);
        match result {
            Err(SurrogateError::UnsupportedDistribution {
                parameter,
                distribution,
            }) => {
                assert_eq!(parameter, "coolant_temp");
                assert_eq!(distribution, "normal");
            }
            other => panic!("expected UnsupportedDistribution, got {other:?}"),
        }
    }

    #[test]
    fn test_non_moose_apps_skipped() {
        let config = r#"{
            "apps": {
                "sampler": {
                    "type": "json",
                    "uncertain-params": {
                        "ignored": {
                            "x": {
                                "human-description": "ignored",
                                "distribution": {"name": "normal", "loc": 0.0, "scale": 1.0}
                            }
                        }
                    }
                }
            }
        }"#;
        // Non-moose app is skipped entirely, so its normal prior never trips
        let specs = parse_parameters_str(config).unwrap();
        assert!(specs.is_empty());
    }

    #[test]
    fn test_malformed_config_is_json_error() {
        assert!(matches!(
            parse_parameters_str("{not json"),
            Err(SurrogateError::Json { .. })
        ));
    }

    #[test]
    fn test_missing_distribution_fields_rejected() {
        let config = r#"{
            "apps": {
                "thermal": {
                    "type": "moose",
                    "uncertain-params": {
                        "BCs": {
                            "coolant_temp": {
                                "human-description": "Coolant temperature [K]",
                                "distribution": {"name": "uniform"}
                            }
                        }
                    }
                }
            }
        }"#;
        assert!(parse_parameters_str(config).is_err());
    }
}
