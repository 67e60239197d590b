//! RFC 5322 / MIME rendering shared by the file-based transports

use std::fs;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::domain::result::TransportError;
use crate::domain::{OutgoingMessage, SenderIdentity};

const CRLF: &str = "\r\n";
const BASE64_LINE: usize = 76;

/// Render `message` as a complete mail, ready for a pickup directory or sendmail
pub fn render_message(
    message: &OutgoingMessage<'_>,
    date: DateTime<Local>,
    message_id: Uuid,
) -> Result<Vec<u8>, TransportError> {
    reject_line_breaks("recipient", message.recipient)?;
    reject_line_breaks("subject", message.subject)?;
    reject_line_breaks("sender", &message.sender.address)?;

    let mut out = String::new();
    header(&mut out, "From", &format_mailbox(message.sender));
    header(&mut out, "To", message.recipient.trim());
    header(&mut out, "Subject", &encode_word(message.subject));
    header(&mut out, "Date", &date.to_rfc2822());
    header(
        &mut out,
        "Message-ID",
        &format!("<{}@{}>", message_id.simple(), domain_of(&message.sender.address)),
    );
    header(&mut out, "MIME-Version", "1.0");

    match message.attachment {
        None => {
            text_part_headers(&mut out);
            out.push_str(CRLF);
            push_base64(&mut out, message.body.as_bytes());
        }
        Some(path) => {
            let data = fs::read(path).map_err(|e| {
                TransportError::send(format!("Failed to read attachment {:?}: {}", path, e))
            })?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment.zip".to_string())
                .replace(['"', '\\'], "_");
            let boundary = format!("=_sealpost_{}", Uuid::new_v4().simple());

            header(
                &mut out,
                "Content-Type",
                &format!("multipart/mixed; boundary=\"{}\"", boundary),
            );
            out.push_str(CRLF);
            out.push_str("This is a multi-part message in MIME format.");
            out.push_str(CRLF);

            out.push_str(&format!("--{}{}", boundary, CRLF));
            text_part_headers(&mut out);
            out.push_str(CRLF);
            push_base64(&mut out, message.body.as_bytes());

            out.push_str(&format!("--{}{}", boundary, CRLF));
            header(
                &mut out,
                "Content-Type",
                &format!("{}; name=\"{}\"", content_type_for(&filename), filename),
            );
            header(
                &mut out,
                "Content-Disposition",
                &format!("attachment; filename=\"{}\"", filename),
            );
            header(&mut out, "Content-Transfer-Encoding", "base64");
            out.push_str(CRLF);
            push_base64(&mut out, &data);

            out.push_str(&format!("--{}--{}", boundary, CRLF));
        }
    }

    Ok(out.into_bytes())
}

fn header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str(CRLF);
}

fn text_part_headers(out: &mut String) {
    header(out, "Content-Type", "text/plain; charset=UTF-8");
    header(out, "Content-Transfer-Encoding", "base64");
}

fn push_base64(out: &mut String, data: &[u8]) {
    let encoded = STANDARD.encode(data);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE) {
        // base64 output is ASCII, so every chunk is valid UTF-8
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str(CRLF);
    }
}

/// RFC 2047 encoded-word for non-ASCII header text
fn encode_word(text: &str) -> String {
    if text.is_ascii() {
        text.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
    }
}

fn format_mailbox(identity: &SenderIdentity) -> String {
    match identity.display_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() && !name.contains(['\r', '\n']) => {
            let shown = if name.is_ascii() {
                format!("\"{}\"", name.replace(['"', '\\'], ""))
            } else {
                encode_word(name)
            };
            format!("{} <{}>", shown, identity.address.trim())
        }
        _ => identity.address.trim().to_string(),
    }
}

fn domain_of(address: &str) -> &str {
    address
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim())
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost")
}

fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".zip") {
        "application/zip"
    } else {
        "application/octet-stream"
    }
}

fn reject_line_breaks(field: &str, value: &str) -> Result<(), TransportError> {
    if value.contains(['\r', '\n']) {
        Err(TransportError::send(format!("{} contains a line break", field)))
    } else {
        Ok(())
    }
}
