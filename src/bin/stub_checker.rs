//! Stub checker for exercising the harness end to end.
//!
//! Implements the checker command line (`<config> <task> <salt> <log>`) and stdout contract, but instead of analysing
//! the log it reads the verdict from it. Log records understood:
//!
//! - `verdict:<n>` - report result `n` (first one wins; default 0)
//! - `tamper` - report a proof derived with the wrong secret
//! - `silent` - print no markers at all
//! - `garbled` - print a non-integer result code
//! - `sleep:<ms>` - sleep before answering
//! - `noise:<n>` - print `n` lines of chatter on both stdout and stderr
//!
//! Exit codes follow the real tester: 99 on bad usage, 1 on config errors, 2 on log errors.

use std::fs;
use std::path::Path;
use std::process;
use std::thread;
use std::time::Duration;

use logcheck::harness::config::load_secret;
use logcheck_core::proof::derive_proof;
use logcheck_core::protocol::{Marker, Salt};
use logcheck_core::records::read_records;

const USAGE_ERROR: i32 = 99;
const CONFIG_ERROR: i32 = 1;
const LOG_ERROR: i32 = 2;

#[derive(Debug, Default)]
struct Script {
    verdict: Option<i64>,
    tamper: bool,
    silent: bool,
    garbled: bool,
    sleep: Option<Duration>,
    noise: usize,
}

fn read_script(log: &Path) -> Result<Script, String> {
    let source = fs::read_to_string(log).map_err(|e| format!("cannot read log '{}': {e}", log.display()))?;
    let records = read_records(&source).map_err(|e| format!("cannot parse log '{}': {e}", log.display()))?;
    let mut script = Script::default();
    for record in &records {
        match record.as_strs().as_slice() {
            ["verdict", n] if script.verdict.is_none() => {
                script.verdict = Some(n.trim().parse().map_err(|_| format!("bad verdict '{n}'"))?);
            }
            ["tamper"] => script.tamper = true,
            ["silent"] => script.silent = true,
            ["garbled"] => script.garbled = true,
            ["sleep", ms] => {
                let ms = ms.trim().parse().map_err(|_| format!("bad sleep '{ms}'"))?;
                script.sleep = Some(Duration::from_millis(ms));
            }
            ["noise", n] => script.noise = n.trim().parse().map_err(|_| format!("bad noise '{n}'"))?,
            _ => {}
        }
    }
    Ok(script)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        let name = args.first().map(String::as_str).unwrap_or("logcheck-stub-checker");
        eprintln!("Usage: {name} <config-file> <task-id> <salt> <log-file>");
        eprintln!();
        process::exit(USAGE_ERROR);
    }
    let (config, task, salt, log) = (&args[1], &args[2], &args[3], &args[4]);

    let secret = match load_secret(Path::new(config)) {
        Ok(secret) => secret,
        Err(e) => {
            eprintln!("Cannot initialize checker: {e}");
            process::exit(CONFIG_ERROR);
        }
    };

    let Some(salt) = salt.parse().ok().and_then(Salt::new) else {
        eprintln!("Program checking error: bad salt '{salt}'");
        println!("{} 0", Marker::ResultCode);
        process::exit(USAGE_ERROR);
    };

    let script = match read_script(Path::new(log)) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Program checking error: {e}");
            println!("{} 0", Marker::ResultCode);
            process::exit(LOG_ERROR);
        }
    };

    if let Some(delay) = script.sleep {
        thread::sleep(delay);
    }
    for i in 0..script.noise {
        println!("processing event {i}");
        eprintln!("debug: event {i}");
    }
    if script.silent {
        println!("Checking completed!");
        return;
    }
    if script.garbled {
        println!("{} many", Marker::ResultCode);
        return;
    }

    let result = script.verdict.unwrap_or(0);
    let signing_secret = if script.tamper { "not-the-secret" } else { secret.expose() };
    let proof = derive_proof(signing_secret, task, salt, result);

    println!("Checking completed!");
    println!("{} {}", Marker::ResultCode, result);
    println!("{} {}", Marker::ProofCode, proof);
}
