//! Headline feeds.
//!
//! [`HeadlineFeed`] yields `(title, link)` pairs in feed order, newest first
//! for the usual RSS publisher. [`RssFeed`] reads RSS 2.0 `<item>` and Atom
//! `<entry>` documents over HTTP.

use std::{borrow::Cow, time::Duration};

use async_trait::async_trait;
use quick_xml::{events::Event, reader::Reader};
use reqwest::Client;
use tracing::debug;

use crate::errors::FeedError;

/// One headline as published by the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
}

#[async_trait]
pub trait HeadlineFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FeedEntry>, FeedError>;
}

/// RSS/Atom feed fetched from a URL on every call.
pub struct RssFeed {
    client: Client,
    url: String,
}

impl RssFeed {
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("market-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl HeadlineFeed for RssFeed {
    async fn fetch(&self) -> Result<Vec<FeedEntry>, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let entries = parse_feed(&body)?;
        debug!(url = %self.url, entries = entries.len(), "fetched feed");
        Ok(entries)
    }
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
}

/// Extracts entries from an RSS 2.0 or Atom document.
///
/// Entries without a title are skipped. For Atom the first `href` of a
/// `<link>` element is used when the element has no text.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| FeedError::Parse(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" | b"entry" => {
                    current = Some(FeedEntry {
                        title: String::new(),
                        link: String::new(),
                    });
                }
                b"title" if current.is_some() => field = Some(Field::Title),
                b"link" if current.is_some() => {
                    field = Some(Field::Link);
                    set_link_from_href(&mut current, &e)?;
                }
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"link" => {
                set_link_from_href(&mut current, &e)?;
            }
            Event::Text(t) => {
                // an unknown entity only costs this node its decoding
                let text = t.unescape_with(html_entity).unwrap_or_else(|err| {
                    debug!(error = %err, "keeping undecodable feed text as-is");
                    Cow::Owned(String::from_utf8_lossy(&t).into_owned())
                });
                append(&mut current, field, &text);
            }
            Event::CData(c) => {
                let bytes = c.into_inner();
                append(&mut current, field, &String::from_utf8_lossy(&bytes));
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"item" | b"entry" => {
                    if let Some(entry) = current.take().filter(|e| !e.title.is_empty()) {
                        entries.push(entry);
                    }
                    field = None;
                }
                b"title" | b"link" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn append(current: &mut Option<FeedEntry>, field: Option<Field>, text: &str) {
    let (Some(entry), Some(field)) = (current.as_mut(), field) else {
        return;
    };
    let target = match field {
        Field::Title => &mut entry.title,
        Field::Link => &mut entry.link,
    };
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text.trim());
}

fn set_link_from_href(
    current: &mut Option<FeedEntry>,
    element: &quick_xml::events::BytesStart<'_>,
) -> Result<(), FeedError> {
    let Some(entry) = current.as_mut() else {
        return Ok(());
    };
    if !entry.link.is_empty() {
        return Ok(());
    }
    let href = element
        .try_get_attribute("href")
        .map_err(|e| FeedError::Parse(e.to_string()))?;
    if let Some(attr) = href {
        let value = attr
            .unescape_value()
            .map_err(|e| FeedError::Parse(e.to_string()))?;
        entry.link = value.trim().to_string();
    }
    Ok(())
}

/// HTML entities commonly found in headlines that XML does not predefine.
fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{a0}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        _ => return None,
    })
}
