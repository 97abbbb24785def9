//! Header and text extraction from raw RFC 5322 messages.

use log::debug;
use mail_parser::{Message, MessageParser, MimeHeaders, PartType};

use super::error::{EmailError, Result};

/// Listing fields taken from a message header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    pub author: String,
    pub subject: String,
}

/// Reads `From` and `Subject` from a header block (or a full message).
///
/// Missing headers come back empty; unparsable input yields empty fields.
pub fn parse_headers(raw: &[u8]) -> HeaderInfo {
    let Some(message) = MessageParser::default().parse(raw) else {
        debug!("Could not parse header block ({} bytes)", raw.len());
        return HeaderInfo::default();
    };
    header_info(&message)
}

fn header_info(message: &Message) -> HeaderInfo {
    HeaderInfo {
        author: message
            .from()
            .and_then(|addr| addr.first().map(format_address))
            .unwrap_or_default(),
        subject: message.subject().unwrap_or_default().to_string(),
    }
}

/// Extracts the readable text of a message.
///
/// `text/plain` parts are taken as they are, `text/html` parts with their tags
/// stripped. Parts are joined with newlines and the result trimmed; a message
/// without text parts yields an empty string.
pub fn extract_text_content(raw: &[u8]) -> Result<String> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| EmailError::ParseError("Failed to parse email message".to_string()))?;

    let mut content = String::new();
    for part in message.parts.iter() {
        if part.attachment_name().is_some() {
            continue;
        }
        match &part.body {
            PartType::Text(text) => {
                content.push_str(text);
                content.push('\n');
            }
            PartType::Html(html) => {
                content.push_str(&html_to_text(html));
                content.push('\n');
            }
            _ => {}
        }
    }

    let content = content.trim().to_string();
    debug!("Extracted {} chars of message text", content.len());
    Ok(content)
}

/// Renders HTML as plain text with entities decoded.
///
/// Non-breaking spaces come back as plain spaces.
pub fn html_to_text(html: &str) -> String {
    nanohtml2text::html2text(html).replace('\u{a0}', " ")
}

fn format_address(addr: &mail_parser::Addr) -> String {
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) => format!("{} <{}>", name, address),
        (Some(name), None) => name.to_string(),
        (None, address) => address.unwrap_or_default().to_string(),
    }
}
