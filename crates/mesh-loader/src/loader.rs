//! Descriptor file discovery, download and reading utilities.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{MeshError, MeshResult};

/// Upstream directory holding the yearly descriptor XML files.
pub const MESH_XML_BASE_URL: &str = "https://nlmpubs.nlm.nih.gov/projects/mesh/MESH_FILES/xmlmesh/";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns the descriptor file name for a release year, e.g. `desc2025.xml`.
pub fn descriptor_file_name(year: u16) -> String {
    format!("desc{year}.xml")
}

/// Returns the URL of the descriptor file for a release year.
pub fn descriptor_url(year: u16) -> String {
    format!("{MESH_XML_BASE_URL}{}", descriptor_file_name(year))
}

/// Downloads the descriptor file for `year` into `dest_dir`.
///
/// The body is streamed to a `.part` file that is renamed once complete, so
/// an interrupted download never leaves a truncated `descYYYY.xml` behind.
/// Returns the path of the downloaded file.
pub fn download_descriptor_file<P: AsRef<Path>>(year: u16, dest_dir: P) -> MeshResult<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir)?;
    let path = dest_dir.join(descriptor_file_name(year));

    tracing::info!("Downloading MeSH descriptors for {}...", year);
    fetch_to_file(&descriptor_url(year), &path)?;
    Ok(path)
}

fn fetch_to_file(url: &str, path: &Path) -> MeshResult<u64> {
    let failed = |e: reqwest::Error| MeshError::Download {
        url: url.to_string(),
        message: e.to_string(),
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(failed)?;
    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(failed)?;

    let partial = path.with_extension("xml.part");
    let mut writer = BufWriter::new(File::create(&partial)?);
    let written = match response.copy_to(&mut writer) {
        Ok(n) => n,
        Err(e) => {
            drop(writer);
            let _ = fs::remove_file(&partial);
            return Err(failed(e));
        }
    };
    writer.flush()?;
    drop(writer);
    fs::rename(&partial, path)?;

    tracing::info!(path = %path.display(), size = %format_bytes(written), "Downloaded descriptor file");
    Ok(written)
}

/// Locates a descriptor XML file.
///
/// If `path` is a file it is returned as is. If it is a directory, the file
/// for `year` is looked up, or, without a year, the `descYYYY.xml` with the
/// highest year.
pub fn discover_descriptor_file<P: AsRef<Path>>(path: P, year: Option<u16>) -> MeshResult<PathBuf> {
    let path = path.as_ref();

    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if !path.exists() {
        return Err(if path.extension().is_some() {
            MeshError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            MeshError::DirectoryNotFound {
                path: path.display().to_string(),
            }
        });
    }

    if let Some(year) = year {
        let candidate = path.join(descriptor_file_name(year));
        if candidate.is_file() {
            return Ok(candidate);
        }
        return Err(MeshError::DescriptorFileMissing {
            pattern: descriptor_file_name(year),
            directory: path.display().to_string(),
        });
    }

    let mut newest: Option<(u16, PathBuf)> = None;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let filename = entry.file_name();
        let filename_str = filename.to_string_lossy();

        let Some(found_year) = extract_year(&filename_str) else {
            continue;
        };
        if newest.as_ref().map_or(true, |(y, _)| found_year > *y) {
            newest = Some((found_year, entry.path()));
        }
    }

    newest
        .map(|(_, p)| p)
        .ok_or_else(|| MeshError::DescriptorFileMissing {
            pattern: "descYYYY.xml".to_string(),
            directory: path.display().to_string(),
        })
}

/// Extracts the release year from a descriptor file name.
///
/// Descriptor files have names like `desc2025.xml`.
fn extract_year(filename: &str) -> Option<u16> {
    let digits = filename.strip_prefix("desc")?.strip_suffix(".xml")?;
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

/// Decodes raw catalog bytes as UTF-8, dropping a leading byte order mark.
pub fn decode_catalog(bytes: Vec<u8>) -> MeshResult<String> {
    let mut text = String::from_utf8(bytes).map_err(|e| {
        MeshError::malformed(
            e.utf8_error().valid_up_to() as u64,
            format!("catalog is not valid UTF-8: {}", e.utf8_error()),
        )
    })?;
    if text.starts_with('\u{feff}') {
        text.replace_range(..'\u{feff}'.len_utf8(), "");
    }
    Ok(text)
}

/// Reads and decodes a descriptor XML file.
pub fn read_catalog<P: AsRef<Path>>(path: P) -> MeshResult<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MeshError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let bytes = fs::read(path)?;
    tracing::debug!(path = %path.display(), size = %format_bytes(bytes.len() as u64), "Read descriptor file");
    decode_catalog(bytes)
}

/// Formats a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_file_name() {
        assert_eq!(descriptor_file_name(2020), "desc2020.xml");
    }

    #[test]
    fn test_descriptor_url() {
        assert_eq!(
            descriptor_url(2020),
            "https://nlmpubs.nlm.nih.gov/projects/mesh/MESH_FILES/xmlmesh/desc2020.xml"
        );
        assert!(descriptor_url(2025).starts_with(MESH_XML_BASE_URL));
    }

    #[test]
    fn test_fetch_rejects_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desc2020.xml");

        let err = fetch_to_file("not a url", &path).unwrap_err();
        assert!(matches!(err, MeshError::Download { ref url, .. } if url == "not a url"));
        assert!(!path.exists());
        assert!(!path.with_extension("xml.part").exists());
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("desc2025.xml"), Some(2025));
        assert_eq!(extract_year("desc20.xml"), None);
        assert_eq!(extract_year("supp2025.xml"), None);
        assert_eq!(extract_year("desc2025.xml.gz"), None);
    }

    #[test]
    fn test_decode_catalog_strips_bom() {
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(b"<A/>");
        assert_eq!(decode_catalog(bytes).unwrap(), "<A/>");
    }

    #[test]
    fn test_decode_catalog_rejects_invalid_utf8() {
        let err = decode_catalog(vec![b'<', 0xff, b'>']).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_discover_newest_year() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["desc2020.xml", "desc2025.xml", "desc2023.xml", "notes.txt"] {
            fs::write(dir.path().join(name), "<DescriptorRecordSet/>").unwrap();
        }

        let found = discover_descriptor_file(dir.path(), None).unwrap();
        assert_eq!(found.file_name().unwrap(), "desc2025.xml");

        let pinned = discover_descriptor_file(dir.path(), Some(2020)).unwrap();
        assert_eq!(pinned.file_name().unwrap(), "desc2020.xml");

        let missing = discover_descriptor_file(dir.path(), Some(1999)).unwrap_err();
        assert!(matches!(missing, MeshError::DescriptorFileMissing { .. }));
    }

    #[test]
    fn test_discover_file_path_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.xml");
        fs::write(&file, "<DescriptorRecordSet/>").unwrap();

        assert_eq!(discover_descriptor_file(&file, Some(2000)).unwrap(), file);
    }

    #[test]
    fn test_discover_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_descriptor_file(dir.path().join("desc2025.xml"), None).unwrap_err();
        assert!(matches!(err, MeshError::FileNotFound { .. }));

        let err = discover_descriptor_file(dir.path().join("nowhere"), None).unwrap_err();
        assert!(matches!(err, MeshError::DirectoryNotFound { .. }));

        let err = discover_descriptor_file(dir.path(), None).unwrap_err();
        assert!(matches!(err, MeshError::DescriptorFileMissing { .. }));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 bytes");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GB");
    }
}
