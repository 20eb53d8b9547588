//! Sequencing of inputs through the object database.
//!
//! Inputs are handled strictly in order: the stdin object first, then each
//! file named on the command line, then (in batch mode) each path read from
//! stdin. Every input is fully processed and its id written and flushed
//! before the next one is looked at, so a failure leaves the ids of all
//! earlier inputs on the output.

use crate::database::ObjectDatabase;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::mode::{Mode, RunConfig};
use crate::path::{self, RootContext};
use crate::quote::unquote_line;
use std::fs::File;
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an input's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file named on the command line.
    File(PathBuf),
    /// The standard input stream itself.
    Stdin,
    /// A file named on a line of batch input.
    StdinPathLine(PathBuf),
}

/// One logical unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub source: Source,
    /// Virtual path handed to the object database.
    pub logical_path: Option<String>,
}

impl InputSpec {
    /// Name used in error messages.
    fn display_name(&self) -> String {
        match (&self.logical_path, &self.source) {
            (Some(path), _) => path.clone(),
            (None, Source::File(p) | Source::StdinPathLine(p)) => p.display().to_string(),
            (None, Source::Stdin) => "standard input".to_string(),
        }
    }
}

/// Drives one run: builds inputs from a [`RunConfig`] and feeds them to an
/// [`ObjectDatabase`], writing one id per line to `out`.
pub struct Ingester<'a, D: ObjectDatabase + ?Sized, W: Write> {
    config: &'a RunConfig,
    root: Option<&'a RootContext>,
    db: &'a D,
    out: W,
    virtual_path: Option<String>,
}

impl<'a, D: ObjectDatabase + ?Sized, W: Write> Ingester<'a, D, W> {
    /// `root` is only consulted for path normalization and should be `None`
    /// unless the run writes objects.
    pub fn new(config: &'a RunConfig, root: Option<&'a RootContext>, db: &'a D, out: W) -> Self {
        let virtual_path = config
            .virtual_path
            .as_deref()
            .map(|vpath| path::normalize(root, vpath));

        Self {
            config,
            root,
            db,
            out,
            virtual_path,
        }
    }

    /// Process every input of the run.
    ///
    /// `stdin` is read as object content in [`Mode::Stdin`] and as a list of
    /// paths in [`Mode::StdinPaths`]; it is untouched otherwise.
    pub fn run<R: BufRead>(&mut self, mut stdin: R) -> Result<()> {
        if self.config.mode == Mode::Stdin {
            let input = InputSpec {
                source: Source::Stdin,
                logical_path: self.virtual_path.clone(),
            };
            self.dispatch(&input, &mut stdin)?;
        }

        let config = self.config;
        for arg in &config.files {
            let input = self.file_input(arg);
            self.dispatch(&input, &mut std::io::empty())?;
        }

        if self.config.mode == Mode::StdinPaths {
            self.hash_stdin_paths(stdin)?;
        }

        Ok(())
    }

    /// Consume the ingester, returning the output writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn file_input(&self, arg: &str) -> InputSpec {
        let normalized = path::normalize(self.root, arg);
        let logical_path = if self.config.no_filters {
            None
        } else {
            Some(self.virtual_path.clone().unwrap_or_else(|| normalized.clone()))
        };

        InputSpec {
            source: Source::File(path::physical(self.root, Path::new(arg))),
            logical_path,
        }
    }

    /// Read paths one line at a time, handling each before reading the next.
    ///
    /// Lines are relative to the current directory, like file arguments.
    fn hash_stdin_paths<R: BufRead>(&mut self, stdin: R) -> Result<()> {
        for line in stdin.split(b'\n') {
            let line = line?;
            let input = self.path_line_input(&unquote_line(&line)?);
            self.dispatch(&input, &mut std::io::empty())?;
        }
        Ok(())
    }

    fn path_line_input(&self, decoded: &[u8]) -> InputSpec {
        let raw = path_from_bytes(decoded);
        let logical = path::normalize(self.root, &String::from_utf8_lossy(decoded));

        InputSpec {
            source: Source::StdinPathLine(path::physical(self.root, &raw)),
            logical_path: Some(logical),
        }
    }

    /// Hash (and maybe store) one input, then print its id.
    fn dispatch(&mut self, input: &InputSpec, stdin: &mut dyn Read) -> Result<Hash> {
        debug!(source = ?input.source, logical_path = ?input.logical_path, "dispatching input");

        let hash = match &input.source {
            Source::Stdin => self.index(input, stdin)?,
            Source::File(p) | Source::StdinPathLine(p) => {
                let mut file = File::open(p).map_err(|e| Error::open(p, self.config.write, e))?;
                self.index(input, &mut file)?
            }
        };

        writeln!(self.out, "{}", hash)?;
        self.out.flush()?;
        Ok(hash)
    }

    fn index(&self, input: &InputSpec, reader: &mut dyn Read) -> Result<Hash> {
        self.db
            .index(
                reader,
                self.config.object_type,
                self.config.write,
                input.logical_path.as_deref(),
            )
            .map_err(|e| Error::index(input.display_name(), self.config.write, e))
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::HashOnly;
    use crate::hash::Algorithm;
    use crate::mode::Options;
    use crate::object::ObjectType;
    use crate::store::Store;
    use std::cell::RefCell;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Records every call so tests can check order and arguments.
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(Vec<u8>, ObjectType, bool, Option<String>)>>,
    }

    impl ObjectDatabase for Recorder {
        fn index(
            &self,
            reader: &mut dyn Read,
            object_type: ObjectType,
            write: bool,
            path: Option<&str>,
        ) -> Result<Hash> {
            let mut content = Vec::new();
            reader.read_to_end(&mut content)?;
            let hash = Hash::of_object(object_type, &content);
            self.calls
                .borrow_mut()
                .push((content, object_type, write, path.map(str::to_string)));
            Ok(hash)
        }
    }

    fn config(opts: Options) -> RunConfig {
        RunConfig::from_options(opts).unwrap()
    }

    fn id(content: &[u8]) -> String {
        Hash::of_object(ObjectType::Blob, content).to_hex()
    }

    fn run(
        config: &RunConfig,
        root: Option<&RootContext>,
        db: &dyn ObjectDatabase,
        stdin: &[u8],
    ) -> (Result<()>, String) {
        let mut ingester = Ingester::new(config, root, db, Vec::new());
        let result = ingester.run(Cursor::new(stdin.to_vec()));
        let out = String::from_utf8(ingester.into_inner()).unwrap();
        (result, out)
    }

    fn file_arg(dir: &TempDir, name: &str, content: &[u8]) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_explicit_files_in_order() {
        let dir = TempDir::new().unwrap();
        let a = file_arg(&dir, "a.txt", b"alpha");
        let b = file_arg(&dir, "b.txt", b"beta");
        let config = config(Options {
            files: vec![b.clone(), a.clone()],
            ..Options::default()
        });

        let recorder = Recorder::default();
        let (result, out) = run(&config, None, &recorder, b"");
        result.unwrap();

        assert_eq!(out, format!("{}\n{}\n", id(b"beta"), id(b"alpha")));
        let calls = recorder.calls.borrow();
        assert_eq!(calls[0].3.as_deref(), Some(b.as_str()));
        assert_eq!(calls[1].3.as_deref(), Some(a.as_str()));
    }

    #[test]
    fn test_hashing_twice_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let a = file_arg(&dir, "a.txt", b"same bytes");
        let config = config(Options {
            files: vec![a.clone(), a],
            ..Options::default()
        });

        let (result, out) = run(&config, None, &HashOnly, b"");
        result.unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
    }

    #[test]
    fn test_stdin_before_files() {
        let dir = TempDir::new().unwrap();
        let x = file_arg(&dir, "x", b"from file");
        let config = config(Options {
            stdin: 1,
            files: vec![x],
            ..Options::default()
        });

        let (result, out) = run(&config, None, &HashOnly, b"from stdin");
        result.unwrap();
        assert_eq!(out, format!("{}\n{}\n", id(b"from stdin"), id(b"from file")));
    }

    #[test]
    fn test_stdin_uses_virtual_path() {
        let config = config(Options {
            stdin: 1,
            path: Some("docs/readme.md".into()),
            ..Options::default()
        });

        let recorder = Recorder::default();
        let (result, _) = run(&config, None, &recorder, b"content");
        result.unwrap();

        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, b"content");
        assert_eq!(calls[0].3.as_deref(), Some("docs/readme.md"));
    }

    #[test]
    fn test_stdin_without_path_has_no_logical_path() {
        let config = config(Options {
            stdin: 1,
            ..Options::default()
        });

        let recorder = Recorder::default();
        run(&config, None, &recorder, b"x").0.unwrap();
        assert_eq!(recorder.calls.borrow()[0].3, None);
    }

    #[test]
    fn test_no_filters_drops_logical_path() {
        let dir = TempDir::new().unwrap();
        let a = file_arg(&dir, "a.txt", b"alpha");
        let config = config(Options {
            no_filters: true,
            files: vec![a],
            ..Options::default()
        });

        let recorder = Recorder::default();
        run(&config, None, &recorder, b"").0.unwrap();
        assert_eq!(recorder.calls.borrow()[0].3, None);
    }

    #[test]
    fn test_virtual_path_overrides_file_path() {
        let dir = TempDir::new().unwrap();
        let a = file_arg(&dir, "a.txt", b"alpha");
        let config = config(Options {
            path: Some("other.txt".into()),
            object_type: Some("tag".into()),
            files: vec![a],
            ..Options::default()
        });

        let recorder = Recorder::default();
        run(&config, None, &recorder, b"").0.unwrap();
        let calls = recorder.calls.borrow();
        assert_eq!(calls[0].1, ObjectType::Tag);
        assert_eq!(calls[0].3.as_deref(), Some("other.txt"));
    }

    #[test]
    fn test_missing_file_aborts_after_earlier_output() {
        let dir = TempDir::new().unwrap();
        let x = file_arg(&dir, "x", b"exists");
        let y = dir.path().join("y").display().to_string();
        let z = file_arg(&dir, "z", b"never reached");
        let config = config(Options {
            files: vec![x, y.clone(), z],
            ..Options::default()
        });

        let recorder = Recorder::default();
        let (result, out) = run(&config, None, &recorder, b"");

        assert_eq!(out, format!("{}\n", id(b"exists")));
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), format!("Cannot open {} to hash", y));
        assert_eq!(recorder.calls.borrow().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_paths_plain_and_quoted() {
        let dir = TempDir::new().unwrap();
        let plain = file_arg(&dir, "plain.txt", b"one");
        let quoted = file_arg(&dir, "a\"b.txt", b"two");
        let quoted_line = format!("\"{}\"", quoted.replace('\\', "\\\\").replace('"', "\\\""));
        let stdin = format!("{}\n{}\n", plain, quoted_line);

        let config = config(Options {
            stdin_paths: true,
            ..Options::default()
        });

        let recorder = Recorder::default();
        let (result, out) = run(&config, None, &recorder, stdin.as_bytes());
        result.unwrap();

        assert_eq!(out, format!("{}\n{}\n", id(b"one"), id(b"two")));
        let calls = recorder.calls.borrow();
        assert_eq!(calls[0].3.as_deref(), Some(plain.as_str()));
        assert_eq!(calls[1].3.as_deref(), Some(quoted.as_str()));
    }

    #[test]
    fn test_stdin_paths_last_line_without_newline() {
        let dir = TempDir::new().unwrap();
        let a = file_arg(&dir, "a", b"A");

        let config = config(Options {
            stdin_paths: true,
            ..Options::default()
        });
        let (result, out) = run(&config, None, &HashOnly, a.as_bytes());
        result.unwrap();
        assert_eq!(out, format!("{}\n", id(b"A")));
    }

    #[test]
    fn test_stdin_paths_bad_quote_stops_batch() {
        let dir = TempDir::new().unwrap();
        let a = file_arg(&dir, "a", b"A");
        let b = file_arg(&dir, "b", b"B");
        let stdin = format!("{}\n\"abc\n{}\n", a, b);

        let config = config(Options {
            stdin_paths: true,
            ..Options::default()
        });

        let recorder = Recorder::default();
        let (result, out) = run(&config, None, &recorder, stdin.as_bytes());

        assert_eq!(out, format!("{}\n", id(b"A")));
        assert!(matches!(result, Err(Error::Quote { .. })));
        assert_eq!(recorder.calls.borrow().len(), 1);
    }

    #[test]
    fn test_stdin_untouched_in_explicit_mode() {
        let config = config(Options::default());
        let recorder = Recorder::default();
        let (result, out) = run(&config, None, &recorder, b"ignored");
        result.unwrap();
        assert!(out.is_empty());
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn test_store_failure_names_input_and_mode() {
        let config = config(Options {
            stdin: 1,
            write: true,
            path: Some("v.txt".into()),
            ..Options::default()
        });

        let (result, out) = run(&config, None, &HashOnly, b"data");
        assert!(out.is_empty());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Unable to add v.txt to database"
        );
    }

    #[test]
    fn test_write_with_root_prefixes_paths() {
        let dir = TempDir::new().unwrap();
        let store = Store::init(dir.path().join(".hashobj"), Algorithm::Blake3).unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("f.txt"), b"nested").unwrap();

        let root = RootContext::new(
            store.root().to_path_buf(),
            dir.path().to_path_buf(),
            PathBuf::from("sub"),
        );
        let config = config(Options {
            write: true,
            files: vec!["f.txt".into()],
            ..Options::default()
        });

        let (result, out) = run(&config, Some(&root), &store, b"");
        result.unwrap();

        let hash = Hash::of_object(ObjectType::Blob, b"nested");
        assert_eq!(out, format!("{}\n", hash));
        assert!(store.contains(&hash));

        let entries = store.journal().read_recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "sub/f.txt");
    }

    #[test]
    fn test_stdin_paths_write_with_root_prefixes_lines() {
        let dir = TempDir::new().unwrap();
        let store = Store::init(dir.path().join(".hashobj"), Algorithm::Blake3).unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("a"), b"first").unwrap();
        fs::write(sub.join("b"), b"second").unwrap();

        let root = RootContext::new(
            store.root().to_path_buf(),
            dir.path().to_path_buf(),
            PathBuf::from("sub"),
        );
        let config = config(Options {
            write: true,
            stdin_paths: true,
            ..Options::default()
        });

        let (result, out) = run(&config, Some(&root), &store, b"a\n\"b\"\n");
        result.unwrap();

        let first = Hash::of_object(ObjectType::Blob, b"first");
        let second = Hash::of_object(ObjectType::Blob, b"second");
        assert_eq!(out, format!("{}\n{}\n", first, second));
        assert!(store.contains(&first));
        assert!(store.contains(&second));

        let paths: Vec<_> = store
            .journal()
            .read_recent(10)
            .unwrap()
            .into_iter()
            .map(|entry| entry.path)
            .collect();
        assert_eq!(paths, ["sub/a", "sub/b"]);
    }

    #[test]
    fn test_stdin_paths_missing_line_in_write_mode() {
        let dir = TempDir::new().unwrap();
        let root = RootContext::new(
            dir.path().join(".hashobj"),
            dir.path().to_path_buf(),
            PathBuf::from("sub"),
        );
        let config = config(Options {
            write: true,
            stdin_paths: true,
            ..Options::default()
        });

        let recorder = Recorder::default();
        let (result, out) = run(&config, Some(&root), &recorder, b"gone\n");

        assert!(out.is_empty());
        let expected = dir.path().join("sub").join("gone");
        assert_eq!(
            result.unwrap_err().to_string(),
            format!("Cannot open {} to add to database", expected.display())
        );
    }

    #[test]
    fn test_virtual_path_normalized_with_root() {
        let dir = TempDir::new().unwrap();
        let a = file_arg(&dir, "a", b"A");
        let root = RootContext::new(
            dir.path().join(".hashobj"),
            dir.path().to_path_buf(),
            PathBuf::from("sub"),
        );
        let config = config(Options {
            write: true,
            path: Some("v.txt".into()),
            files: vec![a],
            ..Options::default()
        });

        let recorder = Recorder::default();
        run(&config, Some(&root), &recorder, b"").0.unwrap();
        assert_eq!(recorder.calls.borrow()[0].3.as_deref(), Some("sub/v.txt"));
    }

    #[test]
    fn test_write_creates_one_object_per_input() {
        let dir = TempDir::new().unwrap();
        let store = Store::init(dir.path().join(".hashobj"), Algorithm::Blake3).unwrap();
        let a = file_arg(&dir, "a", b"A");
        let b = file_arg(&dir, "b", b"B");

        let hash_config = config(Options {
            files: vec![a.clone(), b.clone()],
            ..Options::default()
        });
        run(&hash_config, None, &store, b"").0.unwrap();
        assert!(!store.contains(&Hash::of_object(ObjectType::Blob, b"A")));

        let write_config = config(Options {
            write: true,
            files: vec![a, b],
            ..Options::default()
        });
        run(&write_config, None, &store, b"").0.unwrap();
        assert!(store.contains(&Hash::of_object(ObjectType::Blob, b"A")));
        assert!(store.contains(&Hash::of_object(ObjectType::Blob, b"B")));
        assert_eq!(store.journal().read_recent(10).unwrap().len(), 2);
    }
}
