use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use ecobreathe::models::{AqiRecord, Observation};
use ecobreathe::{
    CallerContext, Coordinates, DefaultAqiResolver, EcoBreatheConfig, EcoBreatheError,
    ForecastContext, SymptomLog, risk, telemetry,
};
use tracing::{debug, info};

const USAGE: &str = "\
Usage: ecobreathe [--config <path>] <command>

Commands:
  device <aqi> [--ip <addr>] [--last-known <json>]
  aqi [<lat> <lon>] [--ip <addr>] [--last-known <json>]
  assess <temperature> <humidity> [<aqi>] [--symptoms <json>]
  forecast [<lat> <lon>] [--temperature <t>] [--humidity <h>]";

#[derive(Debug, PartialEq)]
struct Cli {
    config_path: Option<PathBuf>,
    command: Command,
}

#[derive(Debug, PartialEq)]
enum Command {
    Device {
        aqi: i32,
        ip: Option<String>,
        last_known: Option<Observation>,
    },
    Aqi {
        coordinates: Option<Coordinates>,
        ip: Option<String>,
        last_known: Option<Observation>,
    },
    Assess {
        temperature: f64,
        humidity: f64,
        aqi: Option<i32>,
        symptoms: Option<SymptomLog>,
    },
    Forecast {
        coordinates: Option<Coordinates>,
        context: ForecastContext,
    },
    Help,
}

/// Remove `name <value>` from the argument list
fn take_flag(args: &mut Vec<String>, name: &str) -> Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("{name} requires a value");
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {what}: '{value}'"))
}

fn parse_coordinates(args: &[String]) -> Result<Option<Coordinates>> {
    match args {
        [] => Ok(None),
        [lat, lon] => Ok(Some(Coordinates::new(
            parse_number(lat, "latitude")?,
            parse_number(lon, "longitude")?,
        )?)),
        _ => bail!("Expected both latitude and longitude"),
    }
}

fn parse_last_known(value: Option<String>) -> Result<Option<Observation>> {
    value
        .map(|json| -> Result<Observation> {
            let record: AqiRecord =
                serde_json::from_str(&json).with_context(|| "Invalid --last-known record")?;
            Ok(Observation::try_from(record)?)
        })
        .transpose()
}

fn parse_args(mut args: Vec<String>) -> Result<Cli> {
    let config_path = take_flag(&mut args, "--config")?.map(PathBuf::from);

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Cli {
            config_path,
            command: Command::Help,
        });
    }

    let name = args.remove(0);
    let command = match name.as_str() {
        "device" => {
            let ip = take_flag(&mut args, "--ip")?;
            let last_known = parse_last_known(take_flag(&mut args, "--last-known")?)?;
            let [aqi] = args.as_slice() else {
                bail!("device expects exactly one AQI value");
            };
            Command::Device {
                aqi: parse_number(aqi, "AQI")?,
                ip,
                last_known,
            }
        }
        "aqi" => {
            let ip = take_flag(&mut args, "--ip")?;
            let last_known = parse_last_known(take_flag(&mut args, "--last-known")?)?;
            Command::Aqi {
                coordinates: parse_coordinates(&args)?,
                ip,
                last_known,
            }
        }
        "assess" => {
            let symptoms = take_flag(&mut args, "--symptoms")?
                .map(|json| serde_json::from_str::<SymptomLog>(&json).with_context(|| "Invalid --symptoms log"))
                .transpose()?;
            let (temperature, humidity, aqi) = match args.as_slice() {
                [t, h] => (t, h, None),
                [t, h, aqi] => (t, h, Some(parse_number(aqi, "AQI")?)),
                _ => bail!("assess expects <temperature> <humidity> [<aqi>]"),
            };
            Command::Assess {
                temperature: parse_number(temperature, "temperature")?,
                humidity: parse_number(humidity, "humidity")?,
                aqi,
                symptoms,
            }
        }
        "forecast" => {
            let defaults = ForecastContext::default();
            let temperature = take_flag(&mut args, "--temperature")?
                .map(|t| parse_number::<f64>(&t, "temperature"))
                .transpose()?
                .unwrap_or(defaults.temperature);
            let humidity = take_flag(&mut args, "--humidity")?
                .map(|h| parse_number::<f64>(&h, "humidity"))
                .transpose()?
                .unwrap_or(defaults.humidity);
            Command::Forecast {
                coordinates: parse_coordinates(&args)?,
                context: ForecastContext {
                    temperature,
                    humidity,
                },
            }
        }
        other => bail!("Unknown command '{other}'\n\n{USAGE}"),
    };

    Ok(Cli {
        config_path,
        command,
    })
}

fn caller_from(ip: Option<String>) -> Option<CallerContext> {
    ip.map(|ip| CallerContext::default().with_forwarded_for(ip))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).with_context(|| "Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if cli.command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = EcoBreatheConfig::load_from_path(cli.config_path)?;
    let _telemetry = telemetry::init(&config.logging)?;
    debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Command::Device {
            aqi,
            ip,
            last_known,
        } => {
            let resolver = DefaultAqiResolver::from_config(&config)?;
            let caller = caller_from(ip);
            let resolved = resolver
                .resolve_from_device(aqi, caller.as_ref(), last_known.as_ref())
                .await;
            if resolved.should_cache() {
                info!("Fresh reading is eligible to replace the last known value");
            }
            print_json(&resolved.to_record())
        }
        Command::Aqi {
            coordinates,
            ip,
            last_known,
        } => {
            let resolver = DefaultAqiResolver::from_config(&config)?;
            let caller = caller_from(ip);
            let resolved = resolver
                .resolve_from_location(coordinates, caller.as_ref(), last_known.as_ref())
                .await;
            print_json(&resolved.to_record())
        }
        Command::Assess {
            temperature,
            humidity,
            aqi,
            symptoms,
        } => print_json(&risk::assess(temperature, humidity, aqi, symptoms.as_ref())),
        Command::Forecast {
            coordinates,
            context,
        } => {
            let resolver = DefaultAqiResolver::from_config(&config)?;
            let forecast = resolver
                .forecast(coordinates, context)
                .await
                .ok_or_else(|| EcoBreatheError::upstream("Open-Meteo", "forecast unavailable"))?;
            print_json(&forecast)
        }
        Command::Help => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let result = match parse_args(std::env::args().skip(1).collect()) {
        Ok(cli) => run(cli).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<EcoBreatheError>() {
                Some(error) => eprintln!("{}", error.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecobreathe::models::Severity;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_device_command() {
        let cli = parse_args(args("--config eco.toml device 0 --ip 203.0.113.7")).unwrap();
        assert_eq!(cli.config_path, Some(PathBuf::from("eco.toml")));
        assert_eq!(
            cli.command,
            Command::Device {
                aqi: 0,
                ip: Some("203.0.113.7".to_string()),
                last_known: None,
            }
        );
    }

    #[test]
    fn test_aqi_command_with_and_without_coordinates() {
        let cli = parse_args(args("aqi 9.0765 7.3986")).unwrap();
        let Command::Aqi { coordinates, .. } = cli.command else {
            panic!("expected aqi command");
        };
        assert_eq!(coordinates, Some(Coordinates::new(9.0765, 7.3986).unwrap()));

        let cli = parse_args(args("aqi")).unwrap();
        assert!(matches!(cli.command, Command::Aqi { coordinates: None, .. }));

        assert!(parse_args(args("aqi 9.0")).is_err());
        assert!(parse_args(args("aqi 91 0")).is_err());
    }

    #[test]
    fn test_last_known_record_is_parsed() {
        let mut argv = args("aqi --last-known");
        argv.push(
            r#"{"aqi": 95, "pm2_5": 35.0, "pm10": null, "latitude": 6.5, "longitude": 3.4,
                "fetched_at": "2026-10-15T08:00:00Z", "source": "open-meteo",
                "coordinate_source": "default"}"#
                .to_string(),
        );
        let cli = parse_args(argv).unwrap();
        let Command::Aqi { last_known, .. } = cli.command else {
            panic!("expected aqi command");
        };
        assert_eq!(last_known.and_then(|o| o.aqi), Some(95));
    }

    #[test]
    fn test_assess_command_with_symptoms() {
        let mut argv = args("assess 35 80 250 --symptoms");
        argv.push(r#"{"symptoms": [{"name": "Wheezing", "severity": "severe"}]}"#.to_string());
        let cli = parse_args(argv).unwrap();
        let Command::Assess {
            temperature,
            humidity,
            aqi,
            symptoms,
        } = cli.command
        else {
            panic!("expected assess command");
        };
        assert_eq!((temperature, humidity, aqi), (35.0, 80.0, Some(250)));
        assert_eq!(symptoms.unwrap().symptoms[0].severity, Severity::Severe);
    }

    #[test]
    fn test_forecast_context_defaults() {
        let cli = parse_args(args("forecast --humidity 55")).unwrap();
        assert_eq!(
            cli.command,
            Command::Forecast {
                coordinates: None,
                context: ForecastContext {
                    temperature: 30.0,
                    humidity: 55.0,
                },
            }
        );
    }

    #[test]
    fn test_invalid_invocations() {
        assert!(parse_args(args("device")).is_err());
        assert!(parse_args(args("device abc")).is_err());
        assert!(parse_args(args("device 12 --ip")).is_err());
        assert!(parse_args(args("assess 30")).is_err());
        assert!(parse_args(args("launch")).is_err());
        assert_eq!(parse_args(Vec::new()).unwrap().command, Command::Help);
    }
}
