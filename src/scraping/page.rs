use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use super::base;
use crate::config::AppConfig;

/// Pseudo-attribute that returns the element's serialized children, the
/// way a browser's `innerHTML` property does.
pub const INNER_HTML: &str = "innerHTML";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("invalid locator `{0}`")]
    InvalidLocator(String),
    #[error("no element matches `{0}`")]
    NotFound(String),
    #[error("element `{locator}` has no `{name}` attribute")]
    MissingAttribute { locator: String, name: String },
    #[error("element `{0}` has no text")]
    Empty(String),
}

/// Read-only view of one loaded page. Every lookup can fail independently;
/// callers decide how a failure degrades.
pub trait PageAccessor {
    fn text(&self, locator: &str) -> Result<String, PageError>;
    fn attribute(&self, locator: &str, name: &str) -> Result<String, PageError>;
    fn current_url(&self) -> String;
    fn raw_source(&self) -> String;
}

pub struct HtmlPage {
    url: String,
    source: String,
    document: Html,
}

impl HtmlPage {
    pub fn new(url: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let document = Html::parse_document(&source);
        Self {
            url: url.into(),
            source,
            document,
        }
    }

    fn first_match(&self, locator: &str) -> Result<ElementRef<'_>, PageError> {
        let selector =
            Selector::parse(locator).map_err(|_| PageError::InvalidLocator(locator.to_string()))?;
        self.document
            .select(&selector)
            .next()
            .ok_or_else(|| PageError::NotFound(locator.to_string()))
    }
}

impl PageAccessor for HtmlPage {
    fn text(&self, locator: &str) -> Result<String, PageError> {
        let element = self.first_match(locator)?;
        let text = base::inner_text(element);
        if text.is_empty() {
            Err(PageError::Empty(locator.to_string()))
        } else {
            Ok(text)
        }
    }

    fn attribute(&self, locator: &str, name: &str) -> Result<String, PageError> {
        let element = self.first_match(locator)?;
        if name == INNER_HTML {
            return Ok(element.inner_html());
        }
        element
            .value()
            .attr(name)
            .map(str::to_string)
            .ok_or_else(|| PageError::MissingAttribute {
                locator: locator.to_string(),
                name: name.to_string(),
            })
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn raw_source(&self) -> String {
        self.source.clone()
    }
}

pub fn build_client(config: &AppConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.clone())
        .build()
        .context("unable to build http client")
}

/// Loads a page and records the post-redirect URL as its current URL.
pub fn fetch_page(client: &Client, url: &str) -> Result<HtmlPage> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("request failed for {url}"))?;
    let response = response
        .error_for_status()
        .with_context(|| format!("non-success status for {url}"))?;
    let final_url = response.url().to_string();
    let body = response
        .text()
        .with_context(|| format!("unable to read response body for {url}"))?;
    Ok(HtmlPage::new(final_url, body))
}
