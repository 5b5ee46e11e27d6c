//! RSS 2.0 item extraction and HTML stripping for news feeds served as XML.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::news_feed::parse_published_date;
use crate::types::FeedArticle;

/// Parse an RSS XML feed into [`FeedArticle`]s.
///
/// Extracts `<item>` elements, pulling `<title>`, `<description>` and
/// `<pubDate>`. HTML in descriptions is stripped. Items without a title are
/// skipped.
pub(super) fn parse_rss_items(xml: &str) -> Result<Vec<FeedArticle>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut in_item = false;
    let mut in_description = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut description = String::new();
    let mut pub_date = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "item" {
                    in_item = true;
                    in_description = false;
                    title.clear();
                    description.clear();
                    pub_date.clear();
                } else if name == "description" && in_item {
                    in_description = true;
                }
                current_tag = name;
            }
            Event::End(e) => {
                let name = e.name();
                let name = name.as_ref();
                if name == b"description" {
                    in_description = false;
                }
                if name == b"item" && in_item {
                    in_item = false;
                    if !title.is_empty() {
                        articles.push(FeedArticle {
                            title: title.clone(),
                            content_text: strip_html(&description),
                            published: parse_published_date(&pub_date),
                        });
                    }
                }
                current_tag.clear();
            }
            Event::Text(e) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    if in_description {
                        // Text after nested tags like <b> arrives as separate events.
                        if !description.is_empty() {
                            description.push(' ');
                        }
                        description.push_str(&text);
                    } else {
                        match current_tag.as_str() {
                            "title" => title = text,
                            "pubDate" => pub_date = text,
                            _ => {}
                        }
                    }
                }
            }
            Event::CData(e) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    if in_description {
                        description = text;
                    } else if current_tag == "title" {
                        title = text.trim().to_string();
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}

/// Strip HTML tags from a string and normalize whitespace.
pub(super) fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
