//! Worker process for `pg_embedded_setup_unpriv`.
//!
//! When the integration tests run as root, the embedded PostgreSQL cluster is
//! driven from this binary under an unprivileged account. It is invoked as
//! `pg-worker <setup|start|stop> <payload.json>`, where the payload is a
//! serialised [`pg_embedded_setup_unpriv::worker::WorkerPayload`].

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use color_eyre::eyre::{Context, Report, Result, bail, eyre};
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
use postgresql_embedded::PostgreSQL;
use tokio::runtime::Builder;

fn main() -> Result<()> {
    color_eyre::install()?;
    let invocation = Invocation::from_args(env::args_os())?;
    invocation.run()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    Setup,
    Start,
    Stop,
}

impl FromStr for Operation {
    type Err = Report;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "setup" => Ok(Self::Setup),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(eyre!(
                "unknown worker operation '{other}'; expected setup, start or stop"
            )),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
        })
    }
}

/// A parsed command line.
#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    operation: Operation,
    payload_path: PathBuf,
}

impl Invocation {
    fn from_args(args: impl IntoIterator<Item = OsString>) -> Result<Self> {
        let mut args = args.into_iter().skip(1);
        let operation = args
            .next()
            .ok_or_else(|| eyre!("missing operation argument"))?
            .to_string_lossy()
            .parse()?;
        let payload_path = PathBuf::from(
            args.next()
                .ok_or_else(|| eyre!("missing payload path argument"))?,
        );
        if let Some(extra) = args.next() {
            bail!(
                "unexpected extra argument '{}'; expected an operation and a payload path",
                extra.to_string_lossy()
            );
        }
        Ok(Self {
            operation,
            payload_path,
        })
    }

    fn run(&self) -> Result<()> {
        let payload = read_payload(&self.payload_path)?;
        let settings = payload
            .settings
            .into_settings()
            .map_err(|err| Report::new(err).wrap_err("failed to rebuild postgres settings"))?;
        export_environment(payload.environment);

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .wrap_err("failed to build worker runtime")?;
        let operation = self.operation;
        let mut postgres = PostgreSQL::new(settings);
        runtime
            .block_on(async move {
                match operation {
                    Operation::Setup => postgres.setup().await,
                    Operation::Start => postgres.start().await,
                    Operation::Stop => postgres.stop().await,
                }
            })
            .wrap_err_with(|| format!("embedded postgres {operation} failed"))
    }
}

fn read_payload(path: &Path) -> Result<WorkerPayload> {
    let raw = fs::read(path)
        .wrap_err_with(|| format!("failed to read worker payload at {}", path.display()))?;
    serde_json::from_slice(&raw)
        .wrap_err_with(|| format!("failed to parse worker payload at {}", path.display()))
}

/// Export the payload's variables; runs before any thread is spawned.
fn export_environment(vars: Vec<(String, Option<PlainSecret>)>) {
    for (name, value) in vars {
        // SAFETY: single-threaded at this point, so nothing reads the
        // environment concurrently.
        unsafe {
            match value {
                Some(value) => env::set_var(&name, value.expose()),
                None => env::remove_var(&name),
            }
        }
    }
}
