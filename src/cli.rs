//! Command-line surface.

use clap::{ArgAction, Parser};
use std::ffi::OsString;

/// Watch directories and mirror their changes.
#[derive(Parser, Debug)]
#[command(
    name = "watchfs",
    about = "Watch and sync files.",
    version,
    disable_version_flag = true
)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Sync mappings: SRC:DST, SRC->DST or SRC<->DST
    #[arg(value_name = "SRC_DIR:DST_DIR", required = true, num_args = 1..)]
    pub sync_mapping: Vec<String>,

    /// Exclude directories, files or glob patterns, separated by comma
    #[arg(long)]
    pub exclude: Option<String>,

    /// Suppress change notifications whose content did not change (-cc)
    #[arg(long = "enable-content-caching")]
    pub enable_content_caching: bool,
}

/// Rewrite the two-letter `-cc` short form, which clap cannot express, into
/// its long spelling.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if arg == "-cc" {
                OsString::from("--enable-content-caching")
            } else {
                arg
            }
        })
        .collect()
}

impl Cli {
    /// Parse from raw arguments, applying [`normalize_args`] first.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }
}
