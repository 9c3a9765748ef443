pub mod plan;
pub mod render;
pub mod run;

use gantry::env::EnvStore;
use gantry::{Error, Result};
use serde::Serialize;

/// Command result: serializable output plus process exit code.
pub type CmdResult<T> = Result<(T, i32)>;

/// Parse repeated `KEY=VALUE` arguments into a store seed.
pub fn parse_env_pairs(pairs: &[String]) -> Result<EnvStore> {
    let mut env = EnvStore::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::config(format!("invalid env entry '{}', expected KEY=VALUE", pair))
        })?;
        env.set(key.trim(), value);
    }
    Ok(env)
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct DataEnvelope<T: Serialize> {
    success: bool,
    data: T,
}

/// Print the JSON envelope and return the process exit code.
pub fn print_result<T: Serialize>(result: CmdResult<T>) -> i32 {
    match result {
        Ok((data, exit_code)) => {
            let envelope = DataEnvelope {
                success: exit_code == 0,
                data,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| "{}".to_string())
            );
            exit_code
        }
        Err(err) => {
            let envelope = ErrorEnvelope {
                success: false,
                error: ErrorBody {
                    code: err.code(),
                    message: err.to_string(),
                },
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| "{}".to_string())
            );
            err.exit_code()
        }
    }
}
