use std::io::ErrorKind;
use std::path::Path as FsPath;

use actix_files::NamedFile;
use actix_web::web::{Data, Path};

use crate::error::Error;
use crate::UploadPath;

/// Serves a stored donation image by name. Names are content digests, so
/// anything with path separators is not ours.
pub async fn fetch(name: Path<(String,)>, upload_path: Data<UploadPath>) -> Result<NamedFile, Error> {
    let (name,) = name.into_inner();
    if name.contains('/') || name.contains("..") {
        return Err(Error::NotFound);
    }
    NamedFile::open(FsPath::new(&upload_path.0).join(&name)).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Error::NotFound
        } else {
            e.into()
        }
    })
}
