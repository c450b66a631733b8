//! Typed outbound webhook request.
//!
//! A message is flattened once into a list of [`FormPart`]s and encoded
//! to `multipart/form-data` from there, so every delivery path consumes
//! the identical value object.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use crate::model::{ChatHistory, FileInfo, Sender};

/// One field of the outbound form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: &'static str,
        value: String,
    },
    Blob {
        name: &'static str,
        data: Vec<u8>,
        file_name: String,
        mime_type: String,
    },
}

/// An outbound webhook request: target URL plus ordered form parts.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub parts: Vec<FormPart>,
}

impl OutboundRequest {
    /// Flatten a message into form parts.
    ///
    /// Audio goes out twice on purpose: `audioData` as base64 for
    /// storage, and `audioFile` as a binary part so the server-side
    /// transcription step triggers.
    #[must_use]
    pub fn from_message(url: impl Into<String>, message: &ChatHistory) -> Self {
        let mut parts = vec![
            text("chatId", message.chat_id.clone()),
            text(
                "sender",
                match message.sender {
                    Sender::User => "user".to_owned(),
                    Sender::Assistant => "assistant".to_owned(),
                },
            ),
            text("sentDate", message.sent_date.to_rfc3339()),
            text("text", message.text.clone()),
            text("isAudio", message.is_audio.to_string()),
            text("hasAttachment", message.has_attachment.to_string()),
            text("duration", message.duration.unwrap_or(0.0).to_string()),
            text(
                "isMixedAttachments",
                message.is_mixed_attachments.to_string(),
            ),
        ];

        if let (Some(file_name), Some(audio_data)) =
            (&message.audio_file_name, &message.audio_data)
        {
            let mime_type = message
                .audio_mime_type
                .clone()
                .unwrap_or_else(|| "audio/webm".to_owned());
            parts.push(text("audioFileName", file_name.clone()));
            parts.push(text("audioData", audio_data.clone()));
            parts.push(text("audioMimeType", mime_type.clone()));

            if let Some(bytes) = decode_audio(audio_data) {
                parts.push(FormPart::Blob {
                    name: "audioFile",
                    data: bytes,
                    file_name: file_name.clone(),
                    mime_type,
                });
            } else {
                tracing::warn!("audio payload is not valid base64; binary part skipped");
            }
        }

        if !message.files.is_empty() {
            parts.push(text("files", files_json(&message.files)));
        }

        Self {
            url: url.into(),
            parts,
        }
    }

    /// Encode into a reqwest multipart form.
    pub fn into_multipart(self) -> Result<reqwest::multipart::Form, super::TransportError> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::Blob {
                    name,
                    data,
                    file_name,
                    mime_type,
                } => {
                    let part = reqwest::multipart::Part::bytes(data)
                        .file_name(file_name)
                        .mime_str(&mime_type)
                        .map_err(|e| {
                            super::TransportError::Network(format!("invalid mime type: {e}"))
                        })?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }

    /// The value of a text part, for assertions and logging.
    #[must_use]
    pub fn text_part(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name: n, value } if *n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

fn text(name: &'static str, value: String) -> FormPart {
    FormPart::Text { name, value }
}

/// Decode base64 audio, tolerating a `data:` URL prefix.
fn decode_audio(audio_data: &str) -> Option<Vec<u8>> {
    let raw = audio_data
        .split_once(',')
        .map_or(audio_data, |(_, rest)| rest);
    BASE64.decode(raw).ok()
}

/// Files travel as one JSON array field, camelCase keys on the wire.
fn files_json(files: &[FileInfo]) -> String {
    let docs: Vec<_> = files
        .iter()
        .map(|f| {
            json!({
                "fileName": f.file_name,
                "fileData": f.file_data,
                "fileMimeType": f.file_mime_type,
                "isVideo": f.is_video,
                "isImage": f.is_image,
                "isDocument": f.is_document,
                "isAudio": f.is_audio,
            })
        })
        .collect();
    serde_json::to_string(&docs).unwrap_or_else(|_| "[]".to_owned())
}
