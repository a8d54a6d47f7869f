//! Link sources
//!
//! Stand-ins for the camera/QR pipeline: the session only ever sees the
//! decoded link string, so anything that can produce one plugs in here.

use std::path::PathBuf;
use tracing::warn;
use visor_session::LinkSource;

/// Reads a decoded link from a file, once.
///
/// Covers the common dev setup where a QR code has been decoded out of
/// band and dropped into a file.
pub struct FileLinkSource {
    path: PathBuf,
    consumed: bool,
}

impl FileLinkSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            consumed: false,
        }
    }
}

impl LinkSource for FileLinkSource {
    fn poll_link(&mut self) -> Option<String> {
        if self.consumed {
            return None;
        }
        self.consumed = true;
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let link = contents.trim().to_string();
                (!link.is_empty()).then_some(link)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read link file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn yields_the_file_contents_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "visor://v1/dev/mqtt/host:1883").unwrap();

        let mut source = FileLinkSource::new(file.path().to_path_buf());
        assert_eq!(
            source.poll_link().as_deref(),
            Some("visor://v1/dev/mqtt/host:1883")
        );
        assert_eq!(source.poll_link(), None);
    }

    #[test]
    fn missing_file_yields_nothing() {
        let mut source = FileLinkSource::new(PathBuf::from("/nonexistent/link.txt"));
        assert_eq!(source.poll_link(), None);
        assert_eq!(source.poll_link(), None);
    }
}
