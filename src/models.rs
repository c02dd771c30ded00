//! Upload sources and small display helpers.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Something that can be uploaded.
pub trait Upload {
    /// File name including any extension, without directories.
    fn name(&self) -> String;

    /// Size in bytes.
    fn size(&self) -> io::Result<u64>;

    /// Read from the current position to the end.
    fn read_all(&mut self) -> io::Result<Vec<u8>>;

    /// Seek back to the start.
    fn rewind(&mut self) -> io::Result<()>;
}

/// A file on the local filesystem.
pub struct LocalFile {
    path: PathBuf,
    file: File,
}

impl LocalFile {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Upload for LocalFile {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0)).map(|_| ())
    }
}

/// An in-memory upload, handy for generated content.
pub struct MemoryFile {
    name: String,
    content: Cursor<Vec<u8>>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: Cursor::new(content.into()),
        }
    }
}

impl Upload for MemoryFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.content.get_ref().len() as u64)
    }

    fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.content.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.content.set_position(0);
        Ok(())
    }
}

/// Split a file name into base name and lower-cased extension.
///
/// A leading dot does not start an extension (`.profile` has none).
pub fn split_name(name: &str) -> (&str, String) {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < name.len() => {
            (&name[..dot], name[dot + 1..].to_ascii_lowercase())
        }
        _ => (name, String::new()),
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
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
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("report.DOCX"), ("report", "docx".to_string()));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", "gz".to_string()));
        assert_eq!(split_name("README"), ("README", String::new()));
        assert_eq!(split_name(".profile"), (".profile", String::new()));
        assert_eq!(split_name("trailing."), ("trailing.", String::new()));
    }

    #[test]
    fn test_memory_file_rewinds() {
        let mut file = MemoryFile::new("notes.txt", "hello");
        assert_eq!(file.name(), "notes.txt");
        assert_eq!(file.size().unwrap(), 5);
        assert_eq!(file.read_all().unwrap(), b"hello");
        assert!(file.read_all().unwrap().is_empty());
        file.rewind().unwrap();
        assert_eq!(file.read_all().unwrap(), b"hello");
    }

    #[test]
    fn test_local_file() {
        let mut temp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        temp.write_all(b"a,b\n1,2\n").unwrap();

        let mut file = LocalFile::open(temp.path()).unwrap();
        assert!(file.name().ends_with(".csv"));
        assert_eq!(file.size().unwrap(), 8);
        assert_eq!(file.read_all().unwrap(), b"a,b\n1,2\n");
        file.rewind().unwrap();
        assert_eq!(file.read_all().unwrap().len(), 8);
    }

    #[test]
    fn test_local_file_missing() {
        assert!(LocalFile::open("/nonexistent/path/file.txt").is_err());
    }
}
