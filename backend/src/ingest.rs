use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentDisposition};
use futures::{StreamExt, TryStreamExt};

/// Multipart field names that may carry the upload, in priority order.
pub const ACCEPTED_FIELDS: [&str; 3] = ["signature", "file", "image"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("No signature image received")]
    MissingImage,
    #[error("Empty filename")]
    EmptyFilename,
    #[error("File must be an image")]
    NotAnImage,
    #[error("File too large")]
    TooLarge { limit: usize },
    #[error("Failed to read upload: {0}")]
    Stream(String),
}

/// A file part of the multipart body under one of the accepted names.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub field_name: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub entries: Vec<FileEntry>,
    /// Names of every file part seen, accepted or not.
    pub file_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Drains the multipart stream, buffering the first file part under each
/// accepted name. Parts without a `filename` are plain form fields and are
/// skipped. A body that is not multipart reads as an empty form.
pub async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<UploadForm, IngestError> {
    let mut form = UploadForm::default();
    let mut seen_part = false;

    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if !seen_part => {
                log::warn!("Request body is not a readable multipart upload: {}", e);
                break;
            }
            Err(e) => return Err(IngestError::Stream(e.to_string())),
        };
        seen_part = true;

        let disposition = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok());
        let name = disposition
            .as_ref()
            .and_then(|d| d.get_name())
            .map(str::to_owned);
        let filename = disposition
            .as_ref()
            .and_then(|d| d.get_filename())
            .map(str::to_owned);
        let content_type = field
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let (Some(name), Some(filename)) = (name, filename) else {
            drain(&mut field).await?;
            continue;
        };
        form.file_fields.push(name.clone());

        let wanted = ACCEPTED_FIELDS.contains(&name.as_str())
            && !form.entries.iter().any(|e| e.field_name == name);
        if !wanted {
            drain(&mut field).await?;
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| IngestError::Stream(e.to_string()))?;
            if bytes.len() + chunk.len() > max_bytes {
                log::warn!("Upload in field '{}' exceeds {} bytes", name, max_bytes);
                return Err(IngestError::TooLarge { limit: max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }

        form.entries.push(FileEntry {
            field_name: name,
            filename,
            content_type,
            bytes,
        });
    }

    Ok(form)
}

async fn drain(field: &mut actix_multipart::Field) -> Result<(), IngestError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| IngestError::Stream(e.to_string()))?;
    }
    Ok(())
}

/// Picks the upload by field priority and validates it.
pub fn select_image(form: UploadForm) -> Result<UploadedImage, IngestError> {
    let UploadForm {
        mut entries,
        file_fields,
    } = form;

    let index = ACCEPTED_FIELDS
        .iter()
        .find_map(|name| entries.iter().position(|e| e.field_name == *name));
    let Some(index) = index else {
        log::warn!("No signature file in request, available fields: {:?}", file_fields);
        return Err(IngestError::MissingImage);
    };
    let entry = entries.swap_remove(index);

    if entry.filename.is_empty() {
        log::warn!("Empty filename received in field '{}'", entry.field_name);
        return Err(IngestError::EmptyFilename);
    }

    log::info!(
        "Received: {} ({})",
        entry.filename,
        entry.content_type.as_deref().unwrap_or("no content type")
    );
    match entry.content_type {
        Some(content_type) if content_type.starts_with("image/") => {
            Ok(UploadedImage {
                bytes: entry.bytes,
                content_type,
                filename: entry.filename,
            })
        }
        other => {
            log::warn!(
                "File {} is not an image (content type {:?})",
                entry.filename,
                other
            );
            Err(IngestError::NotAnImage)
        }
    }
}
