//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (GRASP_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file {0:?}: {1}")]
    DeserialiseError(PathBuf, toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "$GRASP_SW_ROOT/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError> 
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = crate::host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_file(path)
}

/// Load a parameter file from an explicit path.
pub fn load_file<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>
{
    let path = path.as_ref();

    // Load the file into a string
    let params_str = match read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(path.to_path_buf(), e))
    };

    parse(&params_str).map_err(|e| LoadError::DeserialiseError(path.to_path_buf(), e))
}

/// Parse parameters from a TOML string.
pub fn parse<P>(params_str: &str) -> Result<P, toml::de::Error>
where
    P: DeserializeOwned
{
    toml::from_str(params_str)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct TestParams {
        robot: String,
        #[serde(default)]
        rpc_timeout_s: f64,
    }

    #[test]
    fn test_parse() {
        let p: TestParams = parse("robot = \"icubSim\"\nrpc_timeout_s = 240.0\n").unwrap();
        assert_eq!(p.robot, "icubSim");
        assert_eq!(p.rpc_timeout_s, 240.0);

        let p: TestParams = parse("robot = \"icub\"\n").unwrap();
        assert_eq!(p.rpc_timeout_s, 0.0);

        assert!(parse::<TestParams>("rpc_timeout_s = 1.0\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let res: Result<TestParams, _> = load_file("does/not/exist.toml");
        assert!(matches!(res, Err(LoadError::FileLoadError(_, _))));
    }
}
