//! Archive download
//!
//! The zip reader needs random access, so the whole asset is buffered in
//! memory before the archive is opened. Nothing touches the filesystem here.

use crate::error::{Result, STAGE_DOWNLOAD, VendorError};
use crate::{http, output};
use std::io::{Cursor, Read};

/// Read buffer size for the download loop.
const CHUNK_SIZE: usize = 8192;

/// Upper bound on the buffer reserved up front from `Content-Length`.
/// Larger bodies still download; the buffer just grows as bytes arrive.
const MAX_PREALLOC: usize = 64 << 20;

/// One entry of the archive, as listed in its central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub index: usize,
    pub name: String,
}

impl MemberInfo {
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/') || self.name.ends_with('\\')
    }

    /// Last path segment of the member name.
    pub fn base_name(&self) -> &str {
        base_name(&self.name)
    }
}

/// Last `/`-separated segment of an archive path, ignoring trailing slashes.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// In-memory random-access view over a downloaded zip archive.
pub struct ArchiveHandle {
    source: String,
    archive: zip::ZipArchive<Cursor<Vec<u8>>>,
}

impl ArchiveHandle {
    /// Open `bytes` as a zip archive. `source` names it in error messages.
    pub fn from_bytes(source: &str, bytes: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| VendorError::Archive {
            url: source.to_string(),
            source: e,
        })?;
        Ok(Self {
            source: source.to_string(),
            archive,
        })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Members in central-directory order.
    pub fn members(&self) -> Vec<MemberInfo> {
        (0..self.archive.len())
            .filter_map(|index| {
                self.archive.name_for_index(index).map(|name| MemberInfo {
                    index,
                    name: name.to_string(),
                })
            })
            .collect()
    }

    /// Open member `index` and hand its decompressed content to `f`.
    pub fn read_member<T>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut dyn Read) -> Result<T>,
    ) -> Result<T> {
        let mut file = self.archive.by_index(index).map_err(|e| VendorError::Archive {
            url: self.source.clone(),
            source: e,
        })?;
        f(&mut file)
    }
}

/// Download `url` and open it as an archive.
pub fn fetch_archive(agent: &ureq::Agent, url: &str) -> Result<ArchiveHandle> {
    let bytes = download_bytes(agent, url)?;
    output::detail(&format!("downloaded {} bytes", bytes.len()));
    ArchiveHandle::from_bytes(url, bytes)
}

/// GET `url` and buffer the full body, with a progress bar.
pub fn download_bytes(agent: &ureq::Agent, url: &str) -> Result<Vec<u8>> {
    let filename = base_name(url.split(['?', '#']).next().unwrap_or(url)).to_string();
    let pb = output::download_spinner(&format!("downloading {}", filename));

    let response = match agent.get(url).call() {
        Ok(response) => response,
        Err(e) => {
            pb.finish_and_clear();
            return Err(VendorError::network(STAGE_DOWNLOAD, url, e));
        }
    };

    let expected = http::content_length(&response);
    if let Some(len) = expected {
        output::upgrade_to_bytes(&pb, len);
    }

    let capacity = expected
        .and_then(|n| usize::try_from(n).ok())
        .map(|n| n.min(MAX_PREALLOC))
        .unwrap_or(0);
    let mut body = Vec::with_capacity(capacity);
    let mut reader = response.into_reader();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                pb.finish_and_clear();
                return Err(VendorError::NetworkRead {
                    stage: STAGE_DOWNLOAD,
                    url: url.to_string(),
                    source: e,
                });
            }
        };
        body.extend_from_slice(&buffer[..n]);
        pb.set_position(body.len() as u64);
    }

    pb.finish_and_clear();
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::time::Duration;
    use zip::write::SimpleFileOptions;

    /// Serve one canned HTTP response on a loopback port and return its URL.
    fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(response);
        });
        format!("http://{}/asset.zip", addr)
    }

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("sqlite3mc/sqlite3ext.h"), "sqlite3ext.h");
        assert_eq!(base_name("a/b/c.c"), "c.c");
        assert_eq!(base_name("top.h"), "top.h");
        assert_eq!(base_name("dir/"), "dir");
        assert_eq!(base_name("https://host/releases/x.zip"), "x.zip");
    }

    #[test]
    fn test_members_in_archive_order() {
        let bytes = zip_bytes(&[("pkg/", ""), ("pkg/b.h", "b"), ("pkg/a.c", "a")]);
        let handle = ArchiveHandle::from_bytes("test.zip", bytes).unwrap();
        let members = handle.members();
        assert_eq!(handle.len(), 3);
        assert!(members[0].is_dir());
        assert_eq!(members[1].base_name(), "b.h");
        assert_eq!(members[2].base_name(), "a.c");
    }

    #[test]
    fn test_read_member() {
        let bytes = zip_bytes(&[("pkg/a.c", "int x;\n")]);
        let mut handle = ArchiveHandle::from_bytes("test.zip", bytes).unwrap();
        let content = handle
            .read_member(0, |r| {
                let mut s = String::new();
                r.read_to_string(&mut s).unwrap();
                Ok(s)
            })
            .unwrap();
        assert_eq!(content, "int x;\n");
    }

    #[test]
    fn test_oversized_content_length_is_not_trusted() {
        crate::output::set_quiet(true);
        let url = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 9000000000000000000\r\n\r\nPK");
        let agent = http::agent(Some(Duration::from_secs(5)));

        let err = fetch_archive(&agent, &url).err().unwrap();
        assert!(
            matches!(err, VendorError::NetworkRead { .. } | VendorError::Archive { .. }),
            "got {:?}",
            err
        );
    }

    #[test]
    fn test_garbage_is_archive_error() {
        let err = ArchiveHandle::from_bytes("bad.zip", b"not a zip".to_vec()).err().unwrap();
        assert!(matches!(err, VendorError::Archive { .. }));
        assert!(err.to_string().contains("bad.zip"));
    }
}
