use std::collections::BTreeMap;

use tracing::debug;

use super::base;
use super::page::{PageAccessor, PageError};

pub const TITLE: &str = "title";
pub const START_DATE: &str = "start_date";
pub const DATE_TIME: &str = "date_time";
pub const SUMMARY: &str = "summary";
pub const ADDRESS: &str = "address";
pub const IMAGE_URL: &str = "image_url";
pub const DIRECTIONS_URL: &str = "directions_url";
pub const PAGE_URL: &str = "page_url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    Text(&'static str),
    Attribute(&'static str, &'static str),
    CurrentUrl,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldLocator {
    pub field: &'static str,
    pub locator: Locator,
    /// Stored instead of null when the lookup fails.
    pub placeholder: Option<&'static str>,
}

impl FieldLocator {
    pub const fn text(field: &'static str, selector: &'static str) -> Self {
        Self {
            field,
            locator: Locator::Text(selector),
            placeholder: None,
        }
    }

    pub const fn attr(field: &'static str, selector: &'static str, name: &'static str) -> Self {
        Self {
            field,
            locator: Locator::Attribute(selector, name),
            placeholder: None,
        }
    }

    pub const fn current_url(field: &'static str) -> Self {
        Self {
            field,
            locator: Locator::CurrentUrl,
            placeholder: None,
        }
    }

    pub const fn or_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBag {
    values: BTreeMap<&'static str, Option<String>>,
}

impl FieldBag {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|value| value.as_deref())
    }

    pub fn take(&mut self, field: &str) -> Option<String> {
        self.values.get_mut(field).and_then(Option::take)
    }

    pub fn insert(&mut self, field: &'static str, value: Option<String>) {
        self.values.insert(field, value);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves every locator on its own; one missing element never affects the
/// others.
pub fn extract_fields(page: &dyn PageAccessor, locators: &[FieldLocator]) -> FieldBag {
    let mut bag = FieldBag::default();
    for entry in locators {
        let value = match resolve(page, entry.locator) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(field = entry.field, "field unavailable: {err}");
                entry.placeholder.map(str::to_string)
            }
        };
        bag.insert(entry.field, value);
    }
    bag
}

fn resolve(page: &dyn PageAccessor, locator: Locator) -> Result<String, PageError> {
    match locator {
        Locator::Text(selector) => page.text(selector),
        Locator::Attribute(selector, name) => {
            let raw = page.attribute(selector, name)?;
            let cleaned =
                base::non_blank(&raw).ok_or_else(|| PageError::Empty(selector.to_string()))?;
            if matches!(name, "href" | "src") {
                Ok(base::absolute_url(&page.current_url(), Some(cleaned.clone())).unwrap_or(cleaned))
            } else {
                Ok(cleaned)
            }
        }
        Locator::CurrentUrl => {
            let url = page.current_url();
            base::non_blank(&url).ok_or_else(|| PageError::Empty("current url".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::page::HtmlPage;

    const LOCATORS: &[FieldLocator] = &[
        FieldLocator::text(TITLE, "h1.title"),
        FieldLocator::text(SUMMARY, "div.summary").or_placeholder("No summary"),
        FieldLocator::text(ADDRESS, "p.address"),
        FieldLocator::attr(IMAGE_URL, "img.hero", "src"),
        FieldLocator::current_url(PAGE_URL),
    ];

    #[test]
    fn every_field_is_present_when_page_is_complete() {
        let page = HtmlPage::new(
            "https://example.com/e/7",
            r#"<h1 class="title">Gallery Night</h1>
               <div class="summary">Art and wine</div>
               <p class="address">1 Main St</p>
               <img class="hero" src="/img/7.jpg">"#,
        );
        let bag = extract_fields(&page, LOCATORS);
        assert_eq!(bag.len(), 5);
        assert_eq!(bag.get(TITLE), Some("Gallery Night"));
        assert_eq!(bag.get(SUMMARY), Some("Art and wine"));
        assert_eq!(bag.get(IMAGE_URL), Some("https://example.com/img/7.jpg"));
        assert_eq!(bag.get(PAGE_URL), Some("https://example.com/e/7"));
    }

    #[test]
    fn missing_elements_degrade_one_field_at_a_time() {
        let full = r#"<h1 class="title">Gallery Night</h1>
               <div class="summary">Art and wine</div>
               <p class="address">1 Main St</p>
               <img class="hero" src="https://cdn.test/7.jpg">"#;
        let complete = extract_fields(&HtmlPage::new("https://example.com/e/7", full), LOCATORS);

        for (field, fragment) in [
            (TITLE, r#"<h1 class="title">Gallery Night</h1>"#),
            (SUMMARY, r#"<div class="summary">Art and wine</div>"#),
            (ADDRESS, r#"<p class="address">1 Main St</p>"#),
            (IMAGE_URL, r#"<img class="hero" src="https://cdn.test/7.jpg">"#),
        ] {
            let html = full.replace(fragment, "");
            let bag = extract_fields(&HtmlPage::new("https://example.com/e/7", html), LOCATORS);
            for entry in LOCATORS {
                if entry.field == field {
                    assert_eq!(bag.get(field), entry.placeholder, "{field} should degrade");
                } else {
                    assert_eq!(bag.get(entry.field), complete.get(entry.field));
                }
            }
        }
    }

    #[test]
    fn blank_current_url_is_missing() {
        let bag = extract_fields(&HtmlPage::new("", "<p></p>"), LOCATORS);
        assert!(bag.contains(PAGE_URL));
        assert_eq!(bag.get(PAGE_URL), None);
        assert_eq!(bag.get(SUMMARY), Some("No summary"));
    }
}
