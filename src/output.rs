//! Text and JSON rendering for command output.
//!
//! Secret fields are written straight into the output stream. Nothing here
//! builds an owned copy of a decrypted value.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use locker::{Account, ApiKey, ItemId, ItemSummary, ItemType, Note};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    write_json(&mut io::stdout().lock(), value)
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn items_text(items: &[ItemSummary]) -> String {
    if items.is_empty() {
        return "No items stored.".to_string();
    }

    let key_width = items
        .iter()
        .map(|i| i.key.chars().count())
        .chain(std::iter::once("Key".len()))
        .max()
        .unwrap_or_default();

    let mut out = format!("{:<key_width$}  Type\n", "Key");
    out.push_str(&format!("{:-<key_width$}  {:-<7}\n", "", ""));
    for item in items {
        out.push_str(&format!("{:<key_width$}  {}\n", item.key, item.item_type));
    }
    out.pop();
    out
}

fn timestamp(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default()
}

fn rfc3339(t: Option<DateTime<Utc>>) -> Option<String> {
    t.map(|t| t.to_rfc3339())
}

const LABEL_WIDTH: usize = 12;

fn write_fields(out: &mut impl Write, fields: &[(&str, &str)]) -> io::Result<()> {
    for (label, value) in fields {
        let pad = LABEL_WIDTH.saturating_sub(label.len() + 1);
        writeln!(out, "{label}:{:pad$} {value}", "")?;
    }
    Ok(())
}

#[derive(Serialize)]
struct ApiKeyView<'a> {
    id: Option<ItemId>,
    #[serde(rename = "type")]
    item_type: ItemType,
    key: &'a str,
    description: &'a str,
    value: &'a str,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Serialize)]
struct AccountView<'a> {
    id: Option<ItemId>,
    #[serde(rename = "type")]
    item_type: ItemType,
    key: &'a str,
    description: &'a str,
    username: &'a str,
    password: &'a str,
    url: &'a str,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Serialize)]
struct NoteView<'a> {
    id: Option<ItemId>,
    #[serde(rename = "type")]
    item_type: ItemType,
    key: &'a str,
    description: &'a str,
    text: &'a str,
    created_at: Option<String>,
    updated_at: Option<String>,
}

pub fn write_apikey(out: &mut impl Write, item: &ApiKey, json: bool) -> anyhow::Result<()> {
    if json {
        return write_json(
            out,
            &ApiKeyView {
                id: item.id(),
                item_type: ItemType::ApiKey,
                key: item.key(),
                description: item.description(),
                value: item.value(),
                created_at: rfc3339(item.created_at()),
                updated_at: rfc3339(item.updated_at()),
            },
        );
    }

    let created = timestamp(item.created_at());
    let updated = timestamp(item.updated_at());
    write_fields(
        out,
        &[
            ("key", item.key()),
            ("type", "API Key"),
            ("description", item.description()),
            ("value", item.value()),
            ("created", created.as_str()),
            ("updated", updated.as_str()),
        ],
    )?;
    Ok(())
}

pub fn write_account(out: &mut impl Write, item: &Account, json: bool) -> anyhow::Result<()> {
    if json {
        return write_json(
            out,
            &AccountView {
                id: item.id(),
                item_type: ItemType::Account,
                key: item.key(),
                description: item.description(),
                username: item.username(),
                password: item.password(),
                url: item.url(),
                created_at: rfc3339(item.created_at()),
                updated_at: rfc3339(item.updated_at()),
            },
        );
    }

    let created = timestamp(item.created_at());
    let updated = timestamp(item.updated_at());
    write_fields(
        out,
        &[
            ("key", item.key()),
            ("type", "Account"),
            ("description", item.description()),
            ("username", item.username()),
            ("password", item.password()),
            ("url", item.url()),
            ("created", created.as_str()),
            ("updated", updated.as_str()),
        ],
    )?;
    Ok(())
}

pub fn write_note(out: &mut impl Write, item: &Note, json: bool) -> anyhow::Result<()> {
    if json {
        return write_json(
            out,
            &NoteView {
                id: item.id(),
                item_type: ItemType::Note,
                key: item.key(),
                description: item.description(),
                text: item.text(),
                created_at: rfc3339(item.created_at()),
                updated_at: rfc3339(item.updated_at()),
            },
        );
    }

    let created = timestamp(item.created_at());
    let updated = timestamp(item.updated_at());
    write_fields(
        out,
        &[
            ("key", item.key()),
            ("type", "Note"),
            ("description", item.description()),
            ("text", item.text()),
            ("created", created.as_str()),
            ("updated", updated.as_str()),
        ],
    )?;
    Ok(())
}
