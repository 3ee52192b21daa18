//! Product records and the naming rules derived from them.

use crate::sheet::{self, Cell, Sheet};

pub mod column {
    pub const MODEL: &str = "Model";
    pub const QOH: &str = "QOH";
    pub const WL: &str = "WL";
    pub const RETAIL: &str = "Retail";
    pub const MAP: &str = "MAP";
    pub const COST: &str = "Cost";
    pub const LANDED_COST: &str = "Landed Cost";
    pub const SILO_IMAGE: &str = "Silo Image";
    pub const WEBSITE_LINK: &str = "WebSite Link for Context";
    pub const LIFESTYLE_IMAGE: &str = "Lifestyle Image";
    pub const COMMENT: &str = "Comment";
    pub const EDITED_IMAGE: &str = "Edited Image";
}

pub const ERROR_MARKER_PREFIX: &str = "ERROR:";

/// Column positions of the fields the pipeline reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub wl: usize,
    pub silo_image: usize,
    pub lifestyle_image: usize,
    pub model: Option<usize>,
    pub qoh: Option<usize>,
    pub retail: Option<usize>,
    pub map: Option<usize>,
    pub cost: Option<usize>,
    pub landed_cost: Option<usize>,
    pub website_link: Option<usize>,
    pub comment: Option<usize>,
    pub edited_image: Option<usize>,
}

impl Columns {
    /// Resolve column positions; the identifier, source photo and output
    /// columns are mandatory.
    pub fn resolve(sheet: &Sheet) -> Result<Self, sheet::Error> {
        Ok(Self {
            wl: sheet.require_column(column::WL)?,
            silo_image: sheet.require_column(column::SILO_IMAGE)?,
            lifestyle_image: sheet.require_column(column::LIFESTYLE_IMAGE)?,
            model: sheet.column(column::MODEL),
            qoh: sheet.column(column::QOH),
            retail: sheet.column(column::RETAIL),
            map: sheet.column(column::MAP),
            cost: sheet.column(column::COST),
            landed_cost: sheet.column(column::LANDED_COST),
            website_link: sheet.column(column::WEBSITE_LINK),
            comment: sheet.column(column::COMMENT),
            edited_image: sheet.column(column::EDITED_IMAGE),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductRecord {
    pub model: Option<String>,
    pub qoh: Option<i64>,
    pub wl: Option<String>,
    pub retail: Option<f64>,
    pub map: Option<f64>,
    pub cost: Option<f64>,
    pub landed_cost: Option<f64>,
    pub silo_image: Option<String>,
    pub website_link_for_context: Option<String>,
    pub lifestyle_image: Option<String>,
    pub comment: Option<String>,
    pub edited_image: Option<String>,
}

impl ProductRecord {
    pub fn from_row(columns: &Columns, row: &[Cell]) -> Self {
        let cell = |index: Option<usize>| index.and_then(|index| row.get(index));
        let text = |index: Option<usize>| cell(index).and_then(Cell::text);
        let number = |index: Option<usize>| cell(index).and_then(Cell::number);
        Self {
            model: text(columns.model),
            qoh: cell(columns.qoh).and_then(Cell::integer),
            wl: text(Some(columns.wl)),
            retail: number(columns.retail),
            map: number(columns.map),
            cost: number(columns.cost),
            landed_cost: number(columns.landed_cost),
            silo_image: text(Some(columns.silo_image)),
            website_link_for_context: text(columns.website_link),
            lifestyle_image: text(Some(columns.lifestyle_image)),
            comment: text(columns.comment),
            edited_image: text(columns.edited_image),
        }
    }

    pub fn has_error_marker(&self) -> bool {
        self.lifestyle_image.as_deref().is_some_and(is_error_marker)
    }
}

/// Local and remote file name of the generated scene for a product.
pub fn output_filename(wl: &str) -> String {
    format!("{wl}_room.png")
}

pub fn public_url(base_url: &str, filename: &str) -> String {
    format!("{}/{filename}", base_url.trim_end_matches('/'))
}

pub fn error_marker(message: impl std::fmt::Display) -> String {
    format!("{ERROR_MARKER_PREFIX} {message}")
}

pub fn is_error_marker(value: &str) -> bool {
    value.trim_start().starts_with(ERROR_MARKER_PREFIX)
}
