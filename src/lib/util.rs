use crate::errors::*;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub fn read_data_from_stdin() -> Result<String, Error> {
    let mut data = String::new();
    std::io::stdin().read_to_string(&mut data).map_err(
        |_| Error::InputReadFailure
    )?;
    Ok(data)
}

pub fn read_data_from_file(path_str: &str) -> Result<String, Error> {
    let path = Path::new(path_str).canonicalize().map_err(
        |_| Error::InvalidInputPath(path_str.into())
    )?;
    let mut file = File::open(&path).map_err(
        |_| Error::InvalidInputFile(path_str.into())
    )?;
    let mut data = String::new();
    file.read_to_string(&mut data).map_err(
        |_| Error::InputReadFailure
    )?;
    Ok(data)
}

/// Write pretty-printed JSON to the given path, or to stdout if none.
pub fn write_json_output(output_path: &Option<String>, json_data: &str) {
    match output_path {
        Some(path_str) => {
            let mut file = File::create(path_str).unwrap();
            file.write_all(json_data.as_bytes()).unwrap();
        },
        None => {
            println!("{}", json_data);
        }
    }
}
