//! On-demand conversion endpoints for existing media items.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{
    AppState,
    AssetRef,
    AssetResolver,
    BatchResult,
    ConversionOutcome,
    ConversionStatus,
    EntryPoint,
    RecordUpdater,
};
use crate::utils::ErrorKind;

/// Substring the admin page looks for to tell success from failure.
pub const SUCCESS_MARKER: &str = "Erfolgreich";

const CONVERTED_TEXT: &str = "Erfolgreich konvertiert!";
const SKIPPED_TEXT: &str = "Erfolgreich konvertiert! (WebP bereits vorhanden)";
const INVALID_ID_TEXT: &str = "Fehler: Ungültige Bild-ID";
const EMPTY_SELECTION_TEXT: &str = "Keine gültigen Bilder ausgewählt.";

/// Answer of the single-asset endpoint.
///
/// `message` keeps the text contract of the admin page; `success` and
/// `error_kind` carry the same information in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleAck {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<String>,
}

impl SingleAck {
    fn done(text: &str, destination_path: String) -> Self {
        Self {
            success: true,
            message: text.to_string(),
            error_kind: None,
            destination_path: Some(destination_path),
        }
    }

    fn error(kind: ErrorKind) -> Self {
        Self {
            success: false,
            message: failure_text(kind).to_string(),
            error_kind: Some(kind),
            destination_path: None,
        }
    }
}

/// Answer of the bulk endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkResponse {
    pub success: bool,
    pub data: String,
    #[serde(flatten)]
    pub result: Option<BatchResult>,
}

/// Error text shown for a failed single conversion. None of these contain
/// [`SUCCESS_MARKER`].
pub fn failure_text(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::UnsupportedFormat => "Fehler: Nicht unterstütztes Format",
        ErrorKind::NoBackendAvailable => "Fehler: Keine WebP-Unterstützung verfügbar",
        ErrorKind::ConversionFailed => "Fehler bei der Konvertierung.",
        ErrorKind::OutputMissing => "Fehler: WebP-Datei wurde nicht erstellt!",
        ErrorKind::ResolveFailed => "Fehler: Bilddatei nicht gefunden",
        ErrorKind::DestinationUnderivable => "Fehler: Kein WebP-Zielpfad ableitbar",
        ErrorKind::RecordUpdateFailed => "Fehler: Mediathek konnte nicht aktualisiert werden",
    }
}

/// Converts one media item on request.
///
/// `raw_id` is the identifier as received from the client. The declared type
/// is taken from the file content, not from the host record.
pub async fn convert_single(
    state: &AppState,
    raw_id: &str,
    resolver: &dyn AssetResolver,
    updater: &dyn RecordUpdater,
) -> SingleAck {
    let Ok(asset) = raw_id.parse::<AssetRef>() else {
        debug!("Rejected asset id '{}'", raw_id);
        return SingleAck {
            success: false,
            message: INVALID_ID_TEXT.to_string(),
            error_kind: None,
            destination_path: None,
        };
    };

    let source = match resolver.resolve(asset) {
        Ok(source) => source,
        Err(e) => {
            warn!("Cannot resolve asset {}: {}", asset, e);
            return SingleAck::error(ErrorKind::ResolveFailed);
        }
    };

    let pipeline = state.pipeline().clone();
    let outcome = tokio::task::spawn_blocking(move || match source.with_detected_type() {
        Ok(source) => pipeline.run(&source, EntryPoint::OnDemand),
        Err(e) => {
            warn!("Cannot read asset {}: {}", asset, e);
            ConversionOutcome::rejected(ErrorKind::ResolveFailed)
        }
    })
    .await
        .unwrap_or_else(|e| {
            warn!("Conversion task for asset {} panicked: {}", asset, e);
            ConversionOutcome::rejected(ErrorKind::ConversionFailed)
        });

    let text = match outcome.status {
        ConversionStatus::Converted => CONVERTED_TEXT,
        ConversionStatus::Skipped => SKIPPED_TEXT,
        ConversionStatus::Failed => {
            let kind = outcome.error_kind.unwrap_or(ErrorKind::ConversionFailed);
            return SingleAck::error(kind);
        }
    };

    if let Err(e) = updater.update(asset, &outcome.destination_path, &outcome.destination_url) {
        warn!("Record update for asset {} failed: {}", asset, e);
        return SingleAck::error(ErrorKind::RecordUpdateFailed);
    }

    info!("Asset {} converted on request", asset);
    SingleAck::done(text, outcome.destination_path)
}

/// Converts the selected media items.
///
/// Items are isolated from each other; the response lists every failure.
pub async fn convert_bulk(
    state: &AppState,
    assets: &[AssetRef],
    resolver: &dyn AssetResolver,
    updater: &dyn RecordUpdater,
    cancel: &CancellationToken,
) -> BulkResponse {
    if assets.is_empty() {
        return BulkResponse {
            success: false,
            data: EMPTY_SELECTION_TEXT.to_string(),
            result: None,
        };
    }

    let result = state
        .create_runner()
        .detecting_content_type()
        .run(assets, resolver, updater, cancel)
        .await;

    let mut data = format!("{} Bilder erfolgreich konvertiert!", result.succeeded);
    if !result.failures.is_empty() {
        data.push_str(&format!(" {} fehlgeschlagen.", result.failures.len()));
    }
    if result.cancelled > 0 {
        data.push_str(&format!(" {} abgebrochen.", result.cancelled));
    }

    BulkResponse {
        success: true,
        data,
        result: Some(result),
    }
}
