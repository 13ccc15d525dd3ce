// src/fetch/mod.rs
use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::error::DigestError;

pub mod locate;

/// Root of every Digest of Education Statistics page.
pub const BASE_URL: &str = "https://nces.ed.gov/programs/digest/";

/// Caption of the expenditure table this crate retrieves. Matching is fuzzy
/// (see [`locate::normalize`]), so minor wording drift between digest
/// editions still resolves.
pub const PER_PUPIL_CAPTION: &str =
    "total and current expenditures per pupil in public elementary and secondary schools";

static BASE: Lazy<Url> = Lazy::new(|| Url::parse(BASE_URL).expect("digest base URL"));

/// Which digest edition to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestYear {
    /// A specific 4-digit edition year, 2009 or later.
    Specific(u16),
    /// Whatever edition the site currently serves as default.
    Current,
}

impl DigestYear {
    /// Tag used to key cached artifacts on disk.
    pub fn tag(&self) -> String {
        match self {
            DigestYear::Specific(y) => y.to_string(),
            DigestYear::Current => "currentyear".to_string(),
        }
    }
}

/// Handle on one digest edition: validated year, base URL, blocking client.
///
/// Construction performs no I/O; an out-of-range year fails here, before any
/// request is made.
pub struct Digest {
    base: Url,
    year: DigestYear,
    client: Client,
}

impl Digest {
    /// `None` means the site's current edition. Specific years must be
    /// 4-digit, after 2008 (earlier digests use a different table layout),
    /// and no later than the current calendar year.
    pub fn new(year: Option<u16>) -> Result<Self, DigestError> {
        let year = match year {
            Some(y) => {
                let current = Utc::now().year();
                if i32::from(y) <= 2008 || i32::from(y) > current {
                    return Err(DigestError::UnsupportedYear(y));
                }
                DigestYear::Specific(y)
            }
            None => DigestYear::Current,
        };

        Ok(Self {
            base: BASE.clone(),
            year,
            client: Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn year_tag(&self) -> String {
        self.year.tag()
    }

    /// Menu page listing every table of this edition.
    pub fn tables_menu_url(&self) -> Url {
        let path = match self.year {
            DigestYear::Specific(y) => format!("{y}menu_tables.asp"),
            DigestYear::Current => "current_tables.asp".to_string(),
        };
        self.base.join(&path).expect("menu path joins onto base URL")
    }

    /// Blocking GET returning the response body. Network and HTTP-status
    /// failures propagate unmodified; there is no retry layer.
    pub fn fetch_html(&self, url: &Url) -> Result<String> {
        debug!(url = %url, "GET");
        let resp = self
            .client
            .get(url.as_str())
            .send()
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("fetching {url}"))?;
        resp.text().with_context(|| format!("reading body of {url}"))
    }
}
