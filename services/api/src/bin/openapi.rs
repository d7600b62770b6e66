//! services/api/src/bin/openapi.rs
//!
//! Prints the OpenAPI document for the study assistant API.
//!
//! `openapi [PATH]` writes to PATH (default `openapi.json`); `openapi -` writes to stdout.

use api_lib::web::rest::ApiDoc;
use std::io::Write;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    let spec_json = ApiDoc::openapi().to_pretty_json()?;

    if target == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(spec_json.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        std::fs::write(&target, spec_json)?;
        eprintln!("OpenAPI document written to {}", target);
    }
    Ok(())
}
