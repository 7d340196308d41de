//! Post models and normalization from raw documents

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

use super::raw::{RawDocument, RawText};
use super::reading_time::ReadingTime;
use super::rich_text::Body;

/// A post as shown on the listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    /// Slug (unique identifier)
    pub uid: String,

    /// First publication date, absent for documents never published
    pub first_publication_date: Option<DateTime<Utc>>,

    pub data: SummaryData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A post as shown on its own page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub data: DetailData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailData {
    pub title: String,
    pub banner: Option<Banner>,
    pub author: String,
    pub content: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub url: String,
    pub alt: String,
}

/// One content section of a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub heading: String,
    pub body: Body,
}

impl PostSummary {
    /// Keep the slug, the publication date and the three display fields
    pub fn from_raw(doc: &RawDocument) -> Result<Self> {
        Ok(Self {
            uid: required_uid(doc)?,
            first_publication_date: parse_timestamp(doc, doc.first_publication_date.as_deref())?,
            data: SummaryData {
                title: required_title(doc)?,
                subtitle: plain(&doc.data.subtitle),
                author: plain(&doc.data.author),
            },
        })
    }
}

impl PostDetail {
    pub fn from_raw(doc: &RawDocument) -> Result<Self> {
        let banner = doc.data.banner.as_ref().and_then(|image| {
            image.url.as_ref().map(|url| Banner {
                url: url.clone(),
                alt: image.alt.clone().unwrap_or_default(),
            })
        });

        let content = doc
            .data
            .content
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|section| Section {
                heading: plain(&section.heading),
                body: section
                    .body
                    .as_ref()
                    .map(Body::from_raw)
                    .unwrap_or_else(Body::empty),
            })
            .collect();

        Ok(Self {
            uid: required_uid(doc)?,
            first_publication_date: parse_timestamp(doc, doc.first_publication_date.as_deref())?,
            data: DetailData {
                title: required_title(doc)?,
                banner,
                author: plain(&doc.data.author),
                content,
            },
        })
    }

    pub fn reading_time(&self) -> ReadingTime {
        ReadingTime::estimate(&self.data.title, &self.data.content)
    }
}

fn required_uid(doc: &RawDocument) -> Result<String> {
    doc.uid
        .clone()
        .filter(|uid| !uid.trim().is_empty())
        .ok_or_else(|| Error::invalid_record(&doc.id, "missing uid"))
}

fn required_title(doc: &RawDocument) -> Result<String> {
    doc.data
        .title
        .as_ref()
        .map(RawText::to_plain)
        .ok_or_else(|| Error::invalid_record(&doc.id, "missing title"))
}

fn plain(field: &Option<RawText>) -> String {
    field.as_ref().map(RawText::to_plain).unwrap_or_default()
}

/// Parse a service timestamp (`2021-03-15T19:25:28+0000` or RFC 3339)
fn parse_timestamp(doc: &RawDocument, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|date| Some(date.with_timezone(&Utc)))
        .map_err(|e| Error::invalid_record(&doc.id, format!("bad timestamp {:?}: {}", value, e)))
}
