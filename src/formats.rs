//! Upload and export format tables.

use std::io;

use crate::models::{split_name, Upload};
use crate::resource::ResourceKind;

type MimeTable = &'static [(&'static str, &'static [&'static str])];

const DOCUMENT_MIME_TYPES: MimeTable = &[
    ("doc", &["application/msword", "application/vnd.ms-office"]),
    (
        "docx",
        &[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/x-docx",
            "application/zip",
        ],
    ),
    ("htm", &["text/html"]),
    ("html", &["text/html"]),
    ("odt", &["application/vnd.oasis.opendocument.text"]),
    ("pdf", &["application/pdf"]),
    ("rtf", &["application/rtf"]),
    ("sxw", &["application/vnd.sun.xml.writer"]),
    ("txt", &["text/plain"]),
];

const DRAWING_MIME_TYPES: MimeTable = &[
    ("jpeg", &["image/jpeg"]),
    ("png", &["image/png"]),
    ("svg", &["image/svg+xml"]),
];

const PRESENTATION_MIME_TYPES: MimeTable = &[
    ("pps", &["application/vnd.ms-powerpoint"]),
    ("ppt", &["application/vnd.ms-powerpoint"]),
];

const SPREADSHEET_MIME_TYPES: MimeTable = &[
    ("csv", &["text/csv"]),
    ("ods", &["application/x-vnd.oasis.opendocument.spreadsheet"]),
    ("tab", &["text/tab-separated-values"]),
    ("tsv", &["text/tab-separated-values"]),
    ("xls", &["application/vnd.ms-excel"]),
    (
        "xlsx",
        &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"],
    ),
];

pub const DOCUMENT_EXPORT_FORMATS: &[&str] =
    &["txt", "odt", "pdf", "html", "rtf", "doc", "png", "zip"];
pub const DRAWING_EXPORT_FORMATS: &[&str] = &["png", "jpeg", "svg", "pdf"];
pub const PRESENTATION_EXPORT_FORMATS: &[&str] = &["swf", "pdf", "png", "ppt"];
pub const SPREADSHEET_EXPORT_FORMATS: &[&str] = &["xls", "csv", "pdf", "ods", "tsv", "html"];

/// Magic-byte prefixes for files that arrive without an extension.
const SIGNATURES: &[(&[u8], &str)] = &[
    (&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1], "doc"),
    (b"%PDF", "pdf"),
    (b"{\\rtf", "rtf"),
    (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], "png"),
    (&[0xFF, 0xD8, 0xFF], "jpeg"),
    (b"PK\x03\x04", "docx"),
];

/// What the resolver learned about a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFormat {
    /// Lower-cased extension, empty if none could be determined.
    pub extension: String,
    /// MIME type to send, `None` if it could not be inferred.
    pub mime_type: Option<String>,
    /// Service the file belongs to, `None` if unknown.
    pub kind: Option<ResourceKind>,
}

/// Decides MIME types, services and valid formats.
pub trait FormatResolver: Send + Sync {
    /// Inspect a file. Implementations that read it must rewind it.
    fn inspect(&self, file: &mut dyn Upload) -> io::Result<FileFormat>;

    fn valid_upload_format(&self, extension: &str, kind: ResourceKind) -> bool;

    fn valid_export_format(&self, format: &str, kind: ResourceKind) -> bool;
}

/// The built-in tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFormats;

impl StandardFormats {
    /// Extension from the file name, or sniffed from content when the name
    /// has none.
    pub fn extension(&self, file: &mut dyn Upload) -> io::Result<String> {
        let (_, extension) = split_name(&file.name());
        if !extension.is_empty() {
            return Ok(extension);
        }

        file.rewind()?;
        let content = file.read_all()?;
        file.rewind()?;

        Ok(sniff_extension(&content).unwrap_or_default().to_string())
    }
}

impl FormatResolver for StandardFormats {
    fn inspect(&self, file: &mut dyn Upload) -> io::Result<FileFormat> {
        let extension = self.extension(file)?;
        let mime_type = mime_type_for(&extension).map(str::to_string);
        let kind = mime_type.as_deref().and_then(guess_service);

        Ok(FileFormat {
            extension,
            mime_type,
            kind,
        })
    }

    fn valid_upload_format(&self, extension: &str, kind: ResourceKind) -> bool {
        upload_table(kind).iter().any(|(ext, _)| *ext == extension)
    }

    fn valid_export_format(&self, format: &str, kind: ResourceKind) -> bool {
        export_formats(kind).contains(&format)
    }
}

fn upload_table(kind: ResourceKind) -> MimeTable {
    match kind {
        ResourceKind::Document => DOCUMENT_MIME_TYPES,
        ResourceKind::Drawing => DRAWING_MIME_TYPES,
        ResourceKind::Presentation => PRESENTATION_MIME_TYPES,
        ResourceKind::Spreadsheet => SPREADSHEET_MIME_TYPES,
    }
}

pub fn export_formats(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::Document => DOCUMENT_EXPORT_FORMATS,
        ResourceKind::Drawing => DRAWING_EXPORT_FORMATS,
        ResourceKind::Presentation => PRESENTATION_EXPORT_FORMATS,
        ResourceKind::Spreadsheet => SPREADSHEET_EXPORT_FORMATS,
    }
}

/// Canonical MIME type for an extension.
pub fn mime_type_for(extension: &str) -> Option<&'static str> {
    ResourceKind::ALL
        .into_iter()
        .flat_map(|kind| upload_table(kind).iter())
        .find(|(ext, _)| *ext == extension)
        .and_then(|(_, mimes)| mimes.first().copied())
}

/// Service whose tables list this MIME type.
pub fn guess_service(mime_type: &str) -> Option<ResourceKind> {
    ResourceKind::ALL.into_iter().find(|kind| {
        upload_table(*kind)
            .iter()
            .any(|(_, mimes)| mimes.contains(&mime_type))
    })
}

fn sniff_extension(content: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(magic, _)| content.starts_with(magic))
        .map(|(_, extension)| *extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemoryFile;

    #[test]
    fn test_valid_upload_formats() {
        let formats = StandardFormats;
        assert!(formats.valid_upload_format("txt", ResourceKind::Document));
        assert!(formats.valid_upload_format("ppt", ResourceKind::Presentation));
        assert!(formats.valid_upload_format("csv", ResourceKind::Spreadsheet));
        assert!(formats.valid_upload_format("svg", ResourceKind::Drawing));

        assert!(!formats.valid_upload_format("png", ResourceKind::Document));
        assert!(!formats.valid_upload_format("txt", ResourceKind::Presentation));
        assert!(!formats.valid_upload_format("pdf", ResourceKind::Spreadsheet));
    }

    #[test]
    fn test_valid_export_formats() {
        let formats = StandardFormats;
        assert!(formats.valid_export_format("txt", ResourceKind::Document));
        assert!(formats.valid_export_format("pdf", ResourceKind::Presentation));
        assert!(formats.valid_export_format("csv", ResourceKind::Spreadsheet));
        assert!(formats.valid_export_format("svg", ResourceKind::Drawing));

        assert!(!formats.valid_export_format("jpg", ResourceKind::Document));
        assert!(!formats.valid_export_format("txt", ResourceKind::Presentation));
        assert!(!formats.valid_export_format("txt", ResourceKind::Spreadsheet));
        assert!(!formats.valid_export_format("psd", ResourceKind::Document));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for("doc"), Some("application/msword"));
        assert_eq!(mime_type_for("pdf"), Some("application/pdf"));
        assert_eq!(mime_type_for("png"), Some("image/png"));
        assert_eq!(mime_type_for("ppt"), Some("application/vnd.ms-powerpoint"));
        assert_eq!(mime_type_for("xls"), Some("application/vnd.ms-excel"));
        assert_eq!(mime_type_for("csv"), Some("text/csv"));
        assert_eq!(
            mime_type_for("docx"),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
        assert_eq!(mime_type_for("psd"), None);
    }

    #[test]
    fn test_guess_service() {
        assert_eq!(guess_service("application/msword"), Some(ResourceKind::Document));
        assert_eq!(
            guess_service("application/vnd.ms-powerpoint"),
            Some(ResourceKind::Presentation)
        );
        assert_eq!(
            guess_service("application/x-vnd.oasis.opendocument.spreadsheet"),
            Some(ResourceKind::Spreadsheet)
        );
        assert_eq!(guess_service("image/svg+xml"), Some(ResourceKind::Drawing));
        assert_eq!(guess_service("bad/example"), None);
    }

    #[test]
    fn test_inspect_by_extension() {
        let mut file = MemoryFile::new("Budget.XLS", "ignored");
        let format = StandardFormats.inspect(&mut file).unwrap();
        assert_eq!(format.extension, "xls");
        assert_eq!(format.mime_type.as_deref(), Some("application/vnd.ms-excel"));
        assert_eq!(format.kind, Some(ResourceKind::Spreadsheet));
    }

    #[test]
    fn test_inspect_sniffs_file_without_extension() {
        let mut content = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        content.extend_from_slice(b"rest of the compound file");
        let mut file = MemoryFile::new("sample_document", content.clone());

        let format = StandardFormats.inspect(&mut file).unwrap();
        assert_eq!(format.extension, "doc");
        assert_eq!(format.mime_type.as_deref(), Some("application/msword"));
        assert_eq!(format.kind, Some(ResourceKind::Document));
        assert_eq!(file.read_all().unwrap(), content);
    }

    #[test]
    fn test_inspect_unknown_file() {
        let mut file = MemoryFile::new("mystery", "plain words");
        let format = StandardFormats.inspect(&mut file).unwrap();
        assert_eq!(format.extension, "");
        assert_eq!(format.mime_type, None);
        assert_eq!(format.kind, None);

        let mut file = MemoryFile::new("layers.psd", "8BPS");
        let format = StandardFormats.inspect(&mut file).unwrap();
        assert_eq!(format.extension, "psd");
        assert_eq!(format.kind, None);
    }
}
