//! CLI presentation: text and json formatters for identities and contact lists.

use crate::contact::{Contact, LinkPrecedence};
use crate::error::{IdentifyError, StorageError};
use crate::identity::IdentifyResponse;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, IdentifyError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| IdentifyError::Storage(StorageError::Serialization(e.to_string())))
}

fn join_or_dash<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}

pub fn format_identify_response(
    response: &IdentifyResponse,
    format: &str,
) -> Result<String, IdentifyError> {
    if format == "json" {
        return to_json(response);
    }
    let contact = &response.contact;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![
        "Primary contact".to_string(),
        contact.primary_contact_id.to_string(),
    ]);
    table.add_row(vec!["Emails".to_string(), join_or_dash(&contact.emails)]);
    table.add_row(vec![
        "Phone numbers".to_string(),
        join_or_dash(&contact.phone_numbers),
    ]);
    table.add_row(vec![
        "Secondary contacts".to_string(),
        join_or_dash(&contact.secondary_contact_ids),
    ]);
    Ok(table.to_string())
}

pub fn format_contact_list(contacts: &[Contact], format: &str) -> Result<String, IdentifyError> {
    if format == "json" {
        return to_json(&contacts);
    }
    if contacts.is_empty() {
        return Ok("No contacts stored.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Id", "Email", "Phone", "Precedence", "Linked To", "Created At"]);
    for c in contacts {
        let precedence = match c.link_precedence {
            LinkPrecedence::Primary => "primary",
            LinkPrecedence::Secondary => "secondary",
        };
        table.add_row(vec![
            c.id.to_string(),
            c.email.clone().unwrap_or_else(|| "-".to_string()),
            c.phone_number.clone().unwrap_or_else(|| "-".to_string()),
            precedence.to_string(),
            c.linked_id.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string()),
            c.created_at.to_rfc3339(),
        ]);
    }
    Ok(table.to_string())
}
