//! File-backed asset source
//!
//! Resolves asset keys against a root directory and parses them by
//! extension: `.mat.ron` files become material documents, `.vec.ron`
//! files become vector documents, and anything else is handed over as
//! raw bytes. This is the production [`AssetSource`]; tests inject
//! scripted sources instead.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stagecraft_core::{AssetError, AssetSource, SharedObject};

use stagecraft_components::material::MaterialDoc;
use stagecraft_components::sprite::VectorDoc;

/// Loads assets from files under a root directory
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    /// Create a source rooted at a directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The directory keys are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.root.join(key);
        fs::read(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                AssetError::NotFound(key.to_string())
            } else {
                AssetError::Io(err)
            }
        })
    }
}

impl AssetSource for FileAssetSource {
    fn load(&mut self, key: &str) -> Result<SharedObject, AssetError> {
        let bytes = self.read(key)?;

        if key.ends_with(".mat.ron") {
            let text = String::from_utf8(bytes)
                .map_err(|e| AssetError::Parse(format!("{}: {}", key, e)))?;
            let doc: MaterialDoc = ron::from_str(&text)
                .map_err(|e| AssetError::Parse(format!("{}: {}", key, e)))?;
            Ok(Arc::new(doc) as SharedObject)
        } else if key.ends_with(".vec.ron") {
            let text = String::from_utf8(bytes)
                .map_err(|e| AssetError::Parse(format!("{}: {}", key, e)))?;
            let doc: VectorDoc = ron::from_str(&text)
                .map_err(|e| AssetError::Parse(format!("{}: {}", key, e)))?;
            Ok(Arc::new(doc) as SharedObject)
        } else {
            // Textures and other binary payloads stay opaque.
            Ok(Arc::new(bytes) as SharedObject)
        }
    }
}
