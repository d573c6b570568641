//! `parse` subcommand.

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use safe_fetch::{ParseResult, parse};
use serde_json::Value;

use super::exit_code;
use crate::cli::ParseArgs;

/// Common hand-written JSON mistakes, shown by `--examples`.
const MALFORMED_SAMPLES: [&str; 4] = [
    r#"{nombre: "Juan"}"#,
    r#"{"nombre": "Juan",}"#,
    r#"{"edad": undefined}"#,
    r#"{"comillas": 'simple'}"#,
];

pub fn run(args: &ParseArgs) -> Result<ExitCode> {
    if args.examples {
        for sample in MALFORMED_SAMPLES {
            println!("Input: {sample}");
            print_result(&parse(sample), args.envelope)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let text = match &args.text {
        Some(text) => text.clone(),
        None if !io::stdin().is_terminal() => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read JSON from stdin")?;
            buffer
        }
        None => bail!("No input provided. Pass JSON as an argument or pipe it via stdin."),
    };

    let result = parse(&text);
    print_result(&result, args.envelope)?;
    Ok(exit_code(result.is_ok()))
}

fn print_result(result: &ParseResult<Value>, envelope: bool) -> Result<()> {
    if envelope {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }
    match result {
        ParseResult::Parsed(value) => println!("{}", serde_json::to_string_pretty(value)?),
        ParseResult::Failed(failure) => println!("Error: {failure}"),
    }
    Ok(())
}
