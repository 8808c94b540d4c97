#![deny(clippy::unwrap_used)]

use clap::{arg, command, value_parser};
use std::io::ErrorKind;
use std::process::exit;
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mm12ctrl::device::{Device, DeviceConfig, DEFAULT_TURNAROUND};
use mm12ctrl::logger::CsvLogger;
use mm12ctrl::measurement::Measurement;
use mm12ctrl::proto::conv::pretty_ts;
use mm12ctrl::proto::{self, Result};
use mm12ctrl::{DEFAULT_BAUDRATE, DEFAULT_TTY};

#[tokio::main]
async fn main() -> tokio_serial::Result<()> {
    let matches = cli().get_matches();

    init_logging(matches.get_count("debug"));

    match handle_args(&matches).await {
        Ok(()) => {}
        Err(e) => {
            let port = matches
                .get_one::<PathBuf>("device")
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            match e {
                proto::ProtoError::Serial(err) => {
                    if err.kind() == tokio_serial::ErrorKind::NoDevice
                        || matches!(err.kind(), tokio_serial::ErrorKind::Io(ErrorKind::NotFound))
                    {
                        eprintln!("{}: File not found", port);
                    } else {
                        eprintln!("I/O Error: {} [device: {}]", err, port);
                    }
                }
                proto::ProtoError::Io(err) => {
                    if err.kind() == ErrorKind::NotFound {
                        eprintln!("{}: File not found", port);
                    } else {
                        eprintln!("I/O Error: {} [device: {}]", err, port);
                    }
                }
                proto::ProtoError::Csv(err) => {
                    eprintln!("Failed to write log file: {}", err);
                }
                proto::ProtoError::Timeout => {
                    eprintln!("Device did not respond, is it switched on?");
                }
                proto::ProtoError::NotConnected | proto::ProtoError::Abort => {
                    eprintln!("Failed to communicate with device, aborting!");
                }
                proto::ProtoError::Unexpected(_response) => {
                    eprintln!("Received an unexpected response from device, aborting!");
                }
                proto::ProtoError::Decode(err) => {
                    eprintln!("Received an invalid telegram: {}", err);
                }
            }
            exit(-1);
        }
    }

    Ok(())
}

fn cli() -> clap::Command {
    command!() // requires `cargo` feature
        .arg(
            arg!(
                -p --device <PORT> "Port for USB adapter"
            )
            .default_value(DEFAULT_TTY)
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(
            -d --debug ... "Turn debugging information on"
        ))
        .arg(
            arg!(
                -b --baudrate <BAUDRATE> "Baudrate"
            )
            .default_value(DEFAULT_BAUDRATE.to_string())
            .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(
                -t --timeout <MS> "Read timeout in milliseconds"
            )
            .default_value("2000")
            .value_parser(value_parser!(u64)),
        )
        .arg(
            arg!(
                --turnaround <MS> "Pause between request and reading the reply in milliseconds"
            )
            .default_value(DEFAULT_TURNAROUND.as_millis().to_string())
            .value_parser(value_parser!(u64)),
        )
        .subcommand(clap::Command::new("ident").about("Device identification"))
        .subcommand(
            clap::Command::new("read")
                .about("Read current measurement")
                .arg(arg!(--human "Use the unit shown on the display")),
        )
        .subcommand(
            clap::Command::new("poll")
                .about("Read measurements continuously")
                .arg(arg!(--human "Use the unit shown on the display"))
                .arg(
                    arg!(-i --interval <MS> "Delay between readings in milliseconds")
                        .default_value("1000")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    arg!(-n --count <COUNT> "Stop after this many readings")
                        .required(false)
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    arg!(--csv <FILE> "Log readings to a tab separated file")
                        .required(false)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"flush-secs" <SECS> "Seconds between writes to the log file")
                        .default_value("10")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand_required(true)
}

fn init_logging(debug: u8) {
    let level = match debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn read(device: &mut Device, human: bool) -> Result<Measurement> {
    if human {
        device.measurement_human_units().await
    } else {
        device.measurement_base_units().await
    }
}

/// Whether `poll` takes another reading after `done` readings.
fn more_readings(count: Option<u64>, done: u64) -> bool {
    count.map_or(true, |c| done < c)
}

async fn handle_args(matches: &clap::ArgMatches) -> Result<()> {
    let baud_rate = matches
        .get_one::<u32>("baudrate")
        .unwrap_or(&DEFAULT_BAUDRATE);
    let timeout = matches.get_one::<u64>("timeout").copied().unwrap_or(2000);
    let turnaround = matches
        .get_one::<u64>("turnaround")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or(DEFAULT_TURNAROUND);

    if let Some(port_path) = matches.get_one::<PathBuf>("device") {
        let mut device = Device::with_config(DeviceConfig {
            port: port_path.to_string_lossy().to_string(),
            baudrate: *baud_rate,
            timeout: Duration::from_millis(timeout),
            turnaround,
        })?;

        eprintln!("Connected to: {}\n", port_path.display());

        match matches.subcommand() {
            Some(("ident", _args)) => {
                let info = device.ident().await?;
                println!("Model: {}", info.model);
                println!("Serial: {}", info.serial);
                println!("Model ID: {}", info.model_id);
                println!("Firmware: {:.2}", info.firmware);
            }
            Some(("read", args)) => {
                let mea = read(&mut device, args.get_flag("human")).await?;
                println!("{:#}", mea);
            }
            Some(("poll", args)) => {
                let human = args.get_flag("human");
                let interval = Duration::from_millis(
                    args.get_one::<u64>("interval").copied().unwrap_or(1000),
                );
                let count = args.get_one::<u64>("count").copied();
                let mut logger = match args.get_one::<PathBuf>("csv") {
                    Some(path) => {
                        let secs = args.get_one::<u64>("flush-secs").copied().unwrap_or(10);
                        Some(CsvLogger::create(path, Duration::from_secs(secs))?)
                    }
                    None => None,
                };

                let mut n = 0;
                while more_readings(count, n) {
                    let mea = read(&mut device, human).await?;
                    println!("{}  {:#}", pretty_ts(&chrono::Local::now()), mea);
                    if let Some(logger) = logger.as_mut() {
                        logger.log(&mea)?;
                    }
                    n += 1;
                    if more_readings(count, n) {
                        tokio::time::sleep(interval).await;
                    }
                }

                if let Some(logger) = logger.as_mut() {
                    logger.flush()?;
                }
            }
            _ => {
                unreachable!("subcommand is required")
            }
        }

        device.close();
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_turnaround_option() {
        let matches = cli().try_get_matches_from(["mm12cmd", "ident"]).unwrap();
        assert_eq!(
            matches.get_one::<u64>("turnaround").copied(),
            Some(DEFAULT_TURNAROUND.as_millis() as u64)
        );

        let matches = cli()
            .try_get_matches_from(["mm12cmd", "--turnaround", "120", "read"])
            .unwrap();
        assert_eq!(matches.get_one::<u64>("turnaround").copied(), Some(120));
    }

    #[test]
    fn test_poll_stops_after_count() {
        assert!(more_readings(Some(3), 2));
        assert!(!more_readings(Some(3), 3));
        assert!(!more_readings(Some(0), 0));
        assert!(more_readings(None, 1_000_000));
    }
}
