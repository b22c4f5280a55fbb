use std::io;
use std::io::prelude::*;
use std::process;

use freshbooks_sanitize::{logging, parse_body, sanitize, BodyError, Fields, TaxCodes};

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("freshbooks-sanitize: {}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let tax_codes = TaxCodes::from_env()?;

    let mut body = Vec::new();
    io::stdin().lock().read_to_end(&mut body)?;

    let fields = body_fields(&body)?;
    let output = sanitize(&fields, &tax_codes)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &output)?;
    writeln!(out)?;
    Ok(())
}

/// JSON when the first non-blank byte is `{`, form-encoded otherwise.
fn body_fields(body: &[u8]) -> Result<Fields, BodyError> {
    let looks_like_json = body
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map_or(false, |b| *b == b'{');
    let content_type = if looks_like_json { Some("application/json") } else { None };
    parse_body(content_type, trim_trailing_newline(body))
}

// `echo 'a=1' | freshbooks-sanitize` would otherwise leave "1\n" as the value.
fn trim_trailing_newline(body: &[u8]) -> &[u8] {
    let mut end = body.len();
    while end > 0 && (body[end - 1] == b'\n' || body[end - 1] == b'\r') {
        end -= 1;
    }
    &body[..end]
}
