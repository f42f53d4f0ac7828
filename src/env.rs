use std::{cell::RefCell, ffi::OsStr};

use miette::{bail, Result};

/// Enables the execution trace when set to `1`.
pub const TRACE_VAR: &str = "SOLAR_TRACE";
/// Overrides the default clock frequency, in Hz. `0` disables pacing.
pub const CLOCK_VAR: &str = "SOLAR_CLOCK_HZ";

#[derive(Clone, Copy)]
struct Env {
    trace_enabled: bool,
    clock_hz: Option<u64>,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Read configuration from the process environment. Must be called once, before any getter.
pub fn init() -> Result<()> {
    let value = Env {
        trace_enabled: var_is(TRACE_VAR, "1"),
        clock_hz: parse_clock(std::env::var(CLOCK_VAR).ok().as_deref())?,
    };
    set_env(value);
    Ok(())
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace_enabled)
}

pub fn clock_hz() -> Option<u64> {
    with_env(|env| env.clock_hz)
}

fn parse_clock(value: Option<&str>) -> Result<Option<u64>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(hz) => Ok(Some(hz)),
        Err(e) => bail!("Invalid {CLOCK_VAR} value `{value}`: {e}"),
    }
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_values() {
        assert_eq!(parse_clock(None).unwrap(), None);
        assert_eq!(parse_clock(Some("1000")).unwrap(), Some(1000));
        assert_eq!(parse_clock(Some(" 0 ")).unwrap(), Some(0));
        assert!(parse_clock(Some("fast")).is_err());
        assert!(parse_clock(Some("-5")).is_err());
    }
}
