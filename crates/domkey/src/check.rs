//! `domkey check`: validate a config and every selector it names.

use std::io::Write;

use config::Config;
use domkey_engine::selector;

use crate::{Error, Result};

/// Check `selector`, writing a line for it when it does not parse.
fn check_selector(out: &mut impl Write, place: &str, expr: &str) -> Result<bool> {
    match selector::parse(expr) {
        Ok(_) => Ok(true),
        Err(e) => {
            writeln!(out, "  {place}: invalid selector '{expr}': {e}")?;
            Ok(false)
        }
    }
}

/// Print a per-key summary of `cfg` and fail when any selector is invalid.
pub fn check(cfg: &Config, out: &mut impl Write) -> Result<()> {
    let mut invalid = 0;
    writeln!(out, "keys: {}", cfg.combos())?;
    for (key, kc) in &cfg.hot_key_config {
        let chains = kc.operation.as_ref().map(|op| op.chains()).unwrap_or_default();
        let steps: usize = chains.iter().map(Vec::len).sum();
        let mut line = format!("{key}: {} chain(s), {steps} step(s)", chains.len());
        if kc.dynamic {
            line.push_str(", dynamic");
        }
        if let Some(d) = &kc.describe {
            line.push_str(&format!(" ({d})"));
        }
        writeln!(out, "{line}")?;
        for expr in chains.iter().flatten() {
            if !check_selector(out, key, expr)? {
                invalid += 1;
            }
        }
    }
    for (id, entry) in &cfg.operation_control {
        for (keys, expr) in &entry.dynamic_selector {
            if !check_selector(out, &format!("{id}/{keys}"), expr)? {
                invalid += 1;
            }
        }
    }
    writeln!(
        out,
        "{} focus region(s), polling every {}ms up to {} retries",
        cfg.operation_control.len(),
        cfg.polling.delay_ms,
        cfg.polling.max_attempts
    )?;
    if invalid > 0 {
        return Err(Error::InvalidSelectors(invalid));
    }
    writeln!(out, "OK")?;
    Ok(())
}
