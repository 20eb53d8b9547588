//! Store management and object I/O.

use crate::database::ObjectDatabase;
use crate::error::{Error, Result};
use crate::hash::{Algorithm, Hash};
use crate::journal::{Journal, JournalEntry, NO_PATH};
use crate::object::{CompressionType, HEADER_SIZE, ObjectHeader, ObjectType};
use crate::path::RootContext;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the store directory looked for while walking up from the
/// current directory.
pub const STORE_DIR: &str = ".hashobj";

/// Environment variable naming the store directory explicitly.
pub const STORE_DIR_ENV: &str = "HASHOBJ_DIR";

/// Compression threshold: payloads >= 4KB are compressed.
const COMPRESSION_THRESHOLD: usize = 4096;

/// A content-addressed store.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    algorithm: Algorithm,
    journal: Journal,
}

impl Store {
    /// Initialize a new store at the given path.
    ///
    /// Creates the directory structure:
    /// - `objects/blake3-256/` for storing objects
    /// - `config` file with version and algorithm
    /// - `journal` file recording written objects
    pub fn init<P: AsRef<Path>>(root: P, algorithm: Algorithm) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("objects").join(algorithm.as_str()))?;

        let config_content = format!("version=1\nalgo={}\n", algorithm.as_str());
        fs::write(root.join("config"), config_content)?;

        let journal = Journal::open(root.join("journal"))?;

        Ok(Self {
            root,
            algorithm,
            journal,
        })
    }

    /// Open an existing store at the given path.
    ///
    /// Validates the store structure and reads the configuration.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(Error::invalid_store(&root, "directory does not exist"));
        }

        let config_path = root.join("config");
        if !config_path.exists() {
            return Err(Error::invalid_store(&root, "config file not found"));
        }

        let config_content = fs::read_to_string(&config_path)?;
        let algorithm = Self::parse_config(&config_content)?;

        if !root.join("objects").join(algorithm.as_str()).exists() {
            return Err(Error::invalid_store(
                &root,
                "objects directory structure missing",
            ));
        }

        let journal = Journal::open(root.join("journal"))?;

        Ok(Self {
            root,
            algorithm,
            journal,
        })
    }

    /// Parse the config file to extract the algorithm.
    fn parse_config(content: &str) -> Result<Algorithm> {
        let mut version = None;
        let mut algo = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    _ => {}
                }
            }
        }

        if version != Some("1") {
            return Err(Error::invalid_config(format!(
                "Unsupported config version: {:?}",
                version
            )));
        }

        let algo_str = algo.ok_or_else(|| Error::invalid_config("Missing algo in config"))?;
        Algorithm::parse(algo_str)
    }

    /// Get the path to an object file given its hash.
    ///
    /// Returns: `objects/{algorithm}/{prefix}/{suffix}`
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        self.root
            .join("objects")
            .join(self.algorithm.as_str())
            .join(hash.prefix())
            .join(hash.suffix())
    }

    /// Get the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the algorithm used by this store.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Get a reference to the journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Whether an object with this id is present.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.object_path(hash).exists()
    }

    /// Write an object atomically using tempfile.
    fn write_object_atomic(
        &self,
        hash: &Hash,
        header: &ObjectHeader,
        payload: &[u8],
    ) -> Result<()> {
        let obj_path = self.object_path(hash);
        let parent = obj_path
            .parent()
            .ok_or_else(|| Error::invalid_store(&self.root, "object path has no parent"))?;
        fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(&header.encode())?;
        temp_file.write_all(payload)?;
        temp_file.flush()?;
        temp_file.persist(&obj_path)?;

        Ok(())
    }

    /// Store content as an object of the given type.
    ///
    /// Existing objects are left untouched. A journal entry is appended
    /// either way, recording the virtual path the content was written for.
    pub fn put_object(
        &self,
        object_type: ObjectType,
        content: &[u8],
        path: Option<&str>,
    ) -> Result<Hash> {
        let hash = Hash::of_object(object_type, content);

        if self.contains(&hash) {
            debug!(%hash, "object already present");
        } else {
            let (payload, compression) = if content.len() >= COMPRESSION_THRESHOLD {
                (zstd::encode_all(content, 3)?, CompressionType::Zstd)
            } else {
                (content.to_vec(), CompressionType::None)
            };

            let header = ObjectHeader::new(
                object_type,
                self.algorithm,
                compression,
                payload.len() as u64,
            );
            self.write_object_atomic(&hash, &header, &payload)?;
            info!(%hash, kind = %object_type, size = content.len(), "wrote object");
        }

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        self.journal.append(&JournalEntry::new(
            timestamp,
            "hash-object".to_string(),
            hash,
            path.unwrap_or(NO_PATH).to_string(),
            format!("type={},size={}", object_type, content.len()),
        ))?;

        Ok(hash)
    }

    /// Read an object back, verifying its id.
    pub fn read_object(&self, hash: &Hash) -> Result<(ObjectType, Vec<u8>)> {
        let obj_path = self.object_path(hash);
        if !obj_path.exists() {
            return Err(Error::object_not_found(hash.to_hex()));
        }

        let mut file = fs::File::open(&obj_path)?;
        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf)?;
        let header = ObjectHeader::decode(&header_buf)?;

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)?;
        if payload.len() as u64 != header.payload_len {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Payload length mismatch: expected {}, got {}",
                    header.payload_len,
                    payload.len()
                ),
            ));
        }

        let content = match header.compression {
            CompressionType::None => payload,
            CompressionType::Zstd => zstd::decode_all(&payload[..])?,
        };

        let computed = Hash::of_object(header.object_type, &content);
        if computed != *hash {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Hash mismatch: expected {}, got {}",
                    hash.to_hex(),
                    computed.to_hex()
                ),
            ));
        }

        Ok((header.object_type, content))
    }
}

impl ObjectDatabase for Store {
    fn index(
        &self,
        reader: &mut dyn Read,
        object_type: ObjectType,
        write: bool,
        path: Option<&str>,
    ) -> Result<Hash> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        if write {
            self.put_object(object_type, &content, path)
        } else {
            Ok(Hash::of_object(object_type, &content))
        }
    }
}

/// Locate the store for a process running in `cwd`.
///
/// With `explicit` set (from `HASHOBJ_DIR`) that directory is the store and
/// `cwd` is the work tree. Otherwise each ancestor of `cwd` is checked for a
/// `.hashobj` directory; the first one found wins and the prefix is the part
/// of `cwd` below it.
pub fn discover_root(cwd: &Path, explicit: Option<&Path>) -> Option<RootContext> {
    if let Some(store_dir) = explicit {
        return Some(RootContext::new(
            cwd.join(store_dir),
            cwd.to_path_buf(),
            PathBuf::new(),
        ));
    }

    for work_tree in cwd.ancestors() {
        let store_dir = work_tree.join(STORE_DIR);
        if store_dir.join("config").is_file() {
            let prefix_dir = cwd
                .strip_prefix(work_tree)
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let root = RootContext::new(store_dir, work_tree.to_path_buf(), prefix_dir);
            debug!(store = %root.store_dir().display(), prefix = root.prefix(), "discovered store");
            return Some(root);
        }
    }

    None
}
