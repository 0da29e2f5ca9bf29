//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser};

#[derive(Parser, Debug)]
#[command(name = "nrf")]
#[command(about = "NRF service host", long_about = None, version)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigFlags,

    /// Launch and supervise a child instance instead of serving in-process
    #[arg(long)]
    pub exec: bool,
}

/// Flags that select configuration. A supervised child receives the same set.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFlags {
    /// Common config file
    #[arg(long, value_name = "PATH")]
    pub free5gccfg: Option<PathBuf>,

    /// NRF config file
    #[arg(long, value_name = "PATH")]
    pub nrfcfg: Option<PathBuf>,
}

impl ConfigFlags {
    fn entries(&self) -> [(&'static str, Option<&PathBuf>); 2] {
        [
            ("free5gccfg", self.free5gccfg.as_ref()),
            ("nrfcfg", self.nrfcfg.as_ref()),
        ]
    }

    /// Re-emit every flag that has a non-empty value as `--name value`.
    pub fn filter(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (name, value) in self.entries() {
            let Some(value) = value else { continue };
            let value = value.to_string_lossy();
            if value.is_empty() {
                continue;
            }
            args.push(format!("--{name}"));
            args.push(value.into_owned());
        }
        args
    }
}
