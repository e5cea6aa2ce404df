use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::error::Error;

pub trait FileStorer: Send + Sync {
    fn write(&self, bytes: &[u8], extension: Option<&str>) -> Result<String, Error>;
}

/// Content-addressed file store under a local directory. Re-uploading the
/// same bytes lands on the same name.
pub struct LocalStorer {
    path: PathBuf,
}

impl LocalStorer {
    pub fn new(path: &str) -> Self {
        Self { path: PathBuf::from(path) }
    }
}

impl FileStorer for LocalStorer {
    fn write(&self, bytes: &[u8], extension: Option<&str>) -> Result<String, Error> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = format!("{:x}", hasher.finalize());
        let name = match extension {
            Some(ext) => format!("{}.{}", digest, ext),
            None => digest,
        };
        let mut file = File::create(self.path.join(&name))?;
        file.write_all(bytes)?;
        Ok(name)
    }
}

pub fn public_url(name: &str) -> String {
    format!("/uploads/{}", name)
}

#[cfg(test)]
mod test {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> LocalStorer {
        let dir = std::env::temp_dir().join(format!("zipli-store-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        LocalStorer::new(dir.to_str().unwrap())
    }

    #[test]
    fn write_names_file_by_digest() {
        let storer = temp_store();
        let name = storer.write(b"image bytes", Some("jpg")).unwrap();
        assert!(name.ends_with(".jpg"));

        let again = storer.write(b"image bytes", Some("jpg")).unwrap();
        assert_eq!(name, again);

        let stored = std::fs::read(storer.path.join(&name)).unwrap();
        assert_eq!(stored, b"image bytes");
    }

    #[test]
    fn public_url_points_at_uploads() {
        assert_eq!(public_url("abc.jpg"), "/uploads/abc.jpg");
    }
}
