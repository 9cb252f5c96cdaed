use std::path::Path;

use serde::{Deserialize, Serialize};

use seirtools::errors::*;
use seirtools::observed::{get_latest_observed, AggregationLevel};
use seirtools::scaling::model_to_observed_conversion_factors;
use seirtools::util::*;

#[derive(Debug, Serialize, Deserialize)]
struct Config {
    observations_path: String,
    fips: String,
    alignment_index: usize,

    model_acute: Vec<f64>,
    model_icu: Vec<f64>,

    output_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OutputData {
    fips: String,
    hospitalized_factor: f64,
    icu_factor: f64,
    scaled_acute: Vec<f64>,
    scaled_icu: Vec<f64>,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    // Read config from file specified in first command-line argument or from stdin
    let args: Vec<String> = std::env::args().collect();
    let json_data = if args.len() > 1 {
        read_data_from_file(&args[1])?
    }
    else {
        read_data_from_stdin()?
    };
    let config: Config = serde_json::from_str(&json_data)?;

    // If we were given a config file, use its parent as our working directory
    if args.len() > 1 {
        std::env::set_current_dir(&Path::new(&args[1]).parent().unwrap()).unwrap();
    }

    // Conversion factors only exist at the state level so far; estimating
    // a county's factors from its state is an open design question.
    if AggregationLevel::for_fips(&config.fips) == AggregationLevel::County {
        return Err(Error::UnimplementedStrategy(
            "county-level conversion factors".into()
        ));
    }

    let db_path = Path::new(&config.observations_path).canonicalize().map_err(
        |_| Error::InvalidInputPath(config.observations_path.clone())
    )?;
    let db_connection = rusqlite::Connection::open(db_path).unwrap();
    let observed_latest = get_latest_observed(&db_connection, &config.fips)?;

    let factors = model_to_observed_conversion_factors(
        &config.model_acute,
        &config.model_icu,
        config.alignment_index,
        &observed_latest,
    );

    let output_data = OutputData {
        fips: config.fips,
        hospitalized_factor: factors.hospitalized,
        icu_factor: factors.icu,
        scaled_acute: config.model_acute.iter().map(|x| x * factors.hospitalized).collect(),
        scaled_icu: config.model_icu.iter().map(|x| x * factors.icu).collect(),
    };

    let output_json = serde_json::to_string_pretty(&output_data).unwrap();
    write_json_output(&config.output_path, &output_json);

    Ok(())
}
