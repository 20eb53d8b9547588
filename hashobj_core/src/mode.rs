//! Validation of the requested input modes.

use crate::error::{Error, Result};
use crate::object::ObjectType;

/// Where inputs come from for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One object from stdin, followed by any explicit files.
    Stdin,
    /// File names, one per line, from stdin.
    StdinPaths,
    /// Only the files named on the command line.
    Explicit,
}

/// Options as they were given, before validation.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Object type name (`-t`); `None` means blob.
    pub object_type: Option<String>,
    pub write: bool,
    /// Number of times `--stdin` was given.
    pub stdin: u8,
    pub stdin_paths: bool,
    pub no_filters: bool,
    /// Virtual path (`--path`).
    pub path: Option<String>,
    pub files: Vec<String>,
}

/// Validated, immutable configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub object_type: ObjectType,
    pub write: bool,
    pub no_filters: bool,
    pub virtual_path: Option<String>,
    pub mode: Mode,
    pub files: Vec<String>,
}

impl RunConfig {
    /// Check the option combination and build the run configuration.
    ///
    /// The first violated rule is reported.
    pub fn from_options(opts: Options) -> Result<Self> {
        if let Some(reason) = conflict(&opts) {
            return Err(Error::config(reason));
        }

        let object_type = match opts.object_type.as_deref() {
            Some(name) => name
                .parse()
                .map_err(|_| Error::config(format!("invalid object type \"{}\"", name)))?,
            None => ObjectType::default(),
        };

        let mode = if opts.stdin_paths {
            Mode::StdinPaths
        } else if opts.stdin > 0 {
            Mode::Stdin
        } else {
            Mode::Explicit
        };

        Ok(Self {
            object_type,
            write: opts.write,
            no_filters: opts.no_filters,
            virtual_path: opts.path,
            mode,
            files: opts.files,
        })
    }
}

fn conflict(opts: &Options) -> Option<&'static str> {
    if opts.stdin_paths {
        if opts.stdin > 0 {
            Some("Can't use --stdin-paths with --stdin")
        } else if !opts.files.is_empty() {
            Some("Can't specify files with --stdin-paths")
        } else if opts.path.is_some() {
            Some("Can't use --stdin-paths with --path")
        } else if opts.no_filters {
            Some("Can't use --stdin-paths with --no-filters")
        } else {
            None
        }
    } else if opts.stdin > 1 {
        Some("Multiple --stdin arguments are not supported")
    } else if opts.path.is_some() && opts.no_filters {
        Some("Can't use --path with --no-filters")
    } else {
        None
    }
}
