//! Page view model built from the raw portfolio tree.
//!
//! Templates never see raw JSON. The tree is flattened into strings here so a
//! malformed node degrades to odd text instead of a render error.

use serde_json::{Map, Value};

use portfolio_core::{Category, SingletonField};

/// Keys tried, in order, for an entry's heading.
const TITLE_KEYS: &[&str] = &["title", "name", "label"];

/// Keys tried, in order, for an entry's link.
const LINK_KEYS: &[&str] = &["url", "link", "href"];

/// One displayable key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: String,
}

/// A social profile link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
}

/// One entry of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Store key of the entry.
    pub id: String,
    /// Heading (first of `title`, `name`, `label`, else the id).
    pub title: String,
    /// External link, if the entry has an http(s) `url`/`link`/`href`.
    pub link: Option<String>,
    /// Remaining fields.
    pub fields: Vec<Field>,
    /// The entry as pretty JSON, for the editor.
    pub json: String,
}

/// A collection category and its entries, ordered by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<Entry>,
}

/// Everything the pages render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioView {
    /// `profile.name`, if present.
    pub name: Option<String>,
    /// `profile.title`, if present.
    pub title: Option<String>,
    /// Every profile field except `name` and `title`.
    pub profile: Vec<Field>,
    /// Links from `socials`.
    pub socials: Vec<SocialLink>,
    /// Fields of `description`; a plain string becomes one `text` field.
    pub description: Vec<Field>,
    /// Collection categories, ordered by name.
    pub sections: Vec<Section>,
    /// Singleton values as pretty JSON, for the editor, keyed by field name.
    pub singletons_json: Vec<Field>,
}

impl PortfolioView {
    /// Build the view from the value stored at `portfolio`.
    ///
    /// Anything other than an object yields an empty view.
    #[must_use]
    pub fn from_tree(tree: &Value) -> Self {
        let Some(root) = tree.as_object() else {
            return Self::with_empty_singletons();
        };

        let profile = root
            .get(SingletonField::Profile.as_str())
            .and_then(Value::as_object);
        let name = profile.and_then(|p| p.get("name")).map(display_value);
        let title = profile.and_then(|p| p.get("title")).map(display_value);
        let profile = profile
            .map(|p| {
                fields_of(p)
                    .into_iter()
                    .filter(|f| f.key != "name" && f.key != "title")
                    .collect()
            })
            .unwrap_or_default();

        let socials = root
            .get(SingletonField::Socials.as_str())
            .and_then(Value::as_object)
            .map(|links| {
                links
                    .iter()
                    .filter_map(|(name, url)| {
                        let url = url.as_str()?.trim();
                        is_http_url(url).then(|| SocialLink {
                            name: name.clone(),
                            url: url.to_owned(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let description = match root.get(SingletonField::Description.as_str()) {
            Some(Value::Object(map)) => fields_of(map),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![Field {
                key: "text".to_string(),
                value: display_value(other),
            }],
        };

        let mut sections: Vec<Section> = root
            .iter()
            .filter(|(name, _)| Category::is_public_collection_name(name))
            .map(|(name, value)| Section {
                name: name.clone(),
                entries: entries_of(value),
            })
            .collect();
        sections.sort_by(|a, b| a.name.cmp(&b.name));

        let singletons_json = SingletonField::ALL
            .iter()
            .map(|field| Field {
                key: field.as_str().to_string(),
                value: pretty_json(root.get(field.as_str()).unwrap_or(&Value::Null)),
            })
            .collect();

        Self {
            name,
            title,
            profile,
            socials,
            description,
            sections,
            singletons_json,
        }
    }

    fn with_empty_singletons() -> Self {
        Self::from_tree(&Value::Object(Map::new()))
    }

    /// The section called `name`, if it exists.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Display name for the page header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Portfolio")
    }
}

fn entries_of(value: &Value) -> Vec<Entry> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    // serde_json maps iterate in key order, which for push keys is creation order.
    map.iter()
        .map(|(id, entry)| {
            let object = entry.as_object();
            let title = object
                .and_then(|o| TITLE_KEYS.iter().find_map(|k| o.get(*k)))
                .map_or_else(|| id.clone(), display_value);
            let link = object
                .and_then(|o| LINK_KEYS.iter().find_map(|k| o.get(*k)?.as_str()))
                .filter(|url| is_http_url(url))
                .map(str::to_owned);
            let fields = object.map_or_else(
                || {
                    vec![Field {
                        key: "value".to_string(),
                        value: display_value(entry),
                    }]
                },
                |o| {
                    fields_of(o)
                        .into_iter()
                        .filter(|f| {
                            !TITLE_KEYS.contains(&f.key.as_str())
                                && !LINK_KEYS.contains(&f.key.as_str())
                        })
                        .collect()
                },
            );

            Entry {
                id: id.clone(),
                title,
                link,
                fields,
                json: pretty_json(entry),
            }
        })
        .collect()
}

/// Only http(s) URLs are rendered as links.
fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn fields_of(map: &Map<String, Value>) -> Vec<Field> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(key, value)| Field {
            key: key.clone(),
            value: display_value(value),
        })
        .collect()
}

/// Render a JSON value as page text.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn pretty_json(value: &Value) -> String {
    if value.is_null() {
        return "{}".to_string();
    }
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
