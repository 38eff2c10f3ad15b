//! Functions for dealing with multi-media message parts.
//!
//! bedrock:Converse strongly types media, but hosts hand the pipe loose
//! references: a data URI, a remote image URL, or a document URL plus its
//! content.  The functions here do the rote mapping, with format detection
//! kept as explicit pure functions so the heuristics are testable.

use std::ffi::OsStr;
use std::path::Path;

use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::types::{
    DocumentBlock, DocumentFormat, DocumentSource, ImageBlock, ImageFormat, ImageSource,
};
use base64::prelude::*;
use log::debug;

use crate::body::ImageRef;
use crate::error::PipeError;

/// Name used for documents whose URL yields no usable file stem.
const FALLBACK_DOCUMENT_NAME: &str = "document";

/// Normalizes an image reference into a Bedrock image block.
///
/// Data URIs are decoded in place; anything else is fetched with a GET.
/// Unrecognized formats fall back to jpeg rather than failing the message —
/// the model rejects the bytes if the guess is wrong.
pub async fn image_block(image: &ImageRef) -> Result<ImageBlock, PipeError> {
    let (format, bytes) = if let Some(rest) = image.url.strip_prefix("data:") {
        let (head, data) = rest.split_once(',').ok_or_else(|| {
            PipeError::InvalidContent("data URI has no comma-separated payload".to_string())
        })?;
        let bytes = BASE64_STANDARD.decode(data.trim())?;
        (sniff_image_format(head).unwrap_or(ImageFormat::Jpeg), bytes)
    } else {
        let bytes = fetch_image(&image.url).await?;
        let format = image_format_from_extension(&url_extension(&image.url))
            .unwrap_or(ImageFormat::Jpeg);
        (format, bytes)
    };

    let block = ImageBlock::builder()
        .format(format)
        .source(ImageSource::Bytes(Blob::new(bytes)))
        .build()?;
    Ok(block)
}

/// Normalizes a document part into a Bedrock document block.
///
/// `pdf` and `docx` content arrives base64 encoded and is carried as bytes;
/// everything else is treated as UTF-8 text.  The document name comes from
/// the URL's file stem.
pub fn document_block(url: &str, content: &str) -> Result<DocumentBlock, PipeError> {
    let format = document_format_from_extension(&url_extension(url));
    let bytes = match format {
        DocumentFormat::Pdf | DocumentFormat::Docx => BASE64_STANDARD.decode(content.trim())?,
        _ => content.as_bytes().to_vec(),
    };

    let mut name = url_file_stem(url);
    if name.is_empty() {
        name = FALLBACK_DOCUMENT_NAME.to_string();
    }

    let block = DocumentBlock::builder()
        .format(format)
        .name(name)
        .source(DocumentSource::Bytes(Blob::new(bytes)))
        .build()?;
    Ok(block)
}

async fn fetch_image(url: &str) -> Result<Vec<u8>, PipeError> {
    debug!("fetching image: {}", url);
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|source| PipeError::ImageFetch { url: url.to_string(), source })?;
    let bytes = response
        .bytes()
        .await
        .map_err(|source| PipeError::ImageFetch { url: url.to_string(), source })?;
    Ok(bytes.to_vec())
}

/// Guesses the image format from the head of a data URI, e.g.
/// `image/png;base64`.  Substring match rather than strict MIME parsing.
pub fn sniff_image_format(head: &str) -> Option<ImageFormat> {
    if head.contains("png") {
        Some(ImageFormat::Png)
    } else if head.contains("gif") {
        Some(ImageFormat::Gif)
    } else if head.contains("webp") {
        Some(ImageFormat::Webp)
    } else if head.contains("jpeg") || head.contains("jpg") {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

// https://docs.rs/aws-sdk-bedrockruntime/latest/aws_sdk_bedrockruntime/types/enum.ImageFormat.html
pub fn image_format_from_extension(extension: &str) -> Option<ImageFormat> {
    match extension.to_lowercase().as_str() {
        "gif" => Some(ImageFormat::Gif),
        "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        "webp" => Some(ImageFormat::Webp),
        _ => None,
    }
}

// https://docs.rs/aws-sdk-bedrockruntime/latest/aws_sdk_bedrockruntime/types/enum.DocumentFormat.html
pub fn document_format_from_extension(extension: &str) -> DocumentFormat {
    match extension.to_lowercase().as_str() {
        "pdf" => DocumentFormat::Pdf,
        "docx" => DocumentFormat::Docx,
        _ => DocumentFormat::Txt,
    }
}

/// Gets the file extension of a URL path, ignoring query and fragment.
pub fn url_extension(url: &str) -> String {
    Path::new(strip_url_suffix(url))
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Gets the file stem of a URL path, ignoring query and fragment.
pub fn url_file_stem(url: &str) -> String {
    Path::new(strip_url_suffix(url))
        .file_stem()
        .and_then(OsStr::to_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn strip_url_suffix(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_and_stem() {
        let url = "https://example.com/pics/photo.PNG?size=large#top";
        assert_eq!("PNG", url_extension(url));
        assert_eq!("photo", url_file_stem(url));

        let url = "https://example.com/pics/photo";
        assert_eq!("", url_extension(url));
        assert_eq!("photo", url_file_stem(url));
    }

    #[test]
    fn sniffs_data_uri_formats() {
        assert_eq!(Some(ImageFormat::Png), sniff_image_format("image/png;base64"));
        assert_eq!(Some(ImageFormat::Gif), sniff_image_format("image/gif;base64"));
        assert_eq!(Some(ImageFormat::Webp), sniff_image_format("image/webp;base64"));
        assert_eq!(Some(ImageFormat::Jpeg), sniff_image_format("image/jpeg;base64"));
        assert_eq!(Some(ImageFormat::Jpeg), sniff_image_format("image/jpg;base64"));
        assert_eq!(None, sniff_image_format("image/tiff;base64"));
    }

    #[test]
    fn maps_url_extensions() {
        assert_eq!(Some(ImageFormat::Gif), image_format_from_extension("gif"));
        assert_eq!(Some(ImageFormat::Jpeg), image_format_from_extension("JPG"));
        assert_eq!(None, image_format_from_extension("bmp"));

        assert_eq!(DocumentFormat::Pdf, document_format_from_extension("pdf"));
        assert_eq!(DocumentFormat::Docx, document_format_from_extension("docx"));
        assert_eq!(DocumentFormat::Txt, document_format_from_extension("log"));
    }

    #[tokio::test]
    async fn decodes_data_uri_image() {
        let payload = BASE64_STANDARD.encode(b"not really a png");
        let image = ImageRef { url: format!("data:image/png;base64,{payload}") };

        let block = image_block(&image).await.unwrap();
        assert_eq!(&ImageFormat::Png, block.format());
        match block.source() {
            Some(ImageSource::Bytes(blob)) => {
                assert_eq!(b"not really a png".as_slice(), blob.as_ref())
            }
            other => panic!("expected inline bytes, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_malformed_data_uri() {
        let image = ImageRef { url: "data:image/png;base64".to_string() };
        assert!(matches!(
            image_block(&image).await,
            Err(PipeError::InvalidContent(_))
        ));
    }

    #[test]
    fn builds_text_document_from_content() {
        let block = document_block("https://example.com/files/notes.txt", "hello world").unwrap();
        assert_eq!(&DocumentFormat::Txt, block.format());
        assert_eq!("notes", block.name());
        match block.source() {
            Some(DocumentSource::Bytes(blob)) => {
                assert_eq!(b"hello world".as_slice(), blob.as_ref())
            }
            other => panic!("expected inline bytes, got {other:?}"),
        }
    }

    #[test]
    fn decodes_pdf_document_content() {
        let payload = BASE64_STANDARD.encode(b"%PDF-1.7");
        let block = document_block("report.pdf", &payload).unwrap();
        assert_eq!(&DocumentFormat::Pdf, block.format());
        assert_eq!("report", block.name());
    }

    #[test]
    fn unnamed_document_gets_fallback_name() {
        let block = document_block("", "x").unwrap();
        assert_eq!(FALLBACK_DOCUMENT_NAME, block.name());
    }
}
