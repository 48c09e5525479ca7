//! Turns model output or raw chat text into a supplier/buyer profile.
//!
//! Two strategies: [`parse_json_profile`] reads the JSON object the model was
//! asked for, and [`LocalExtractor`] recovers the same fields from free text
//! with regular expressions when the model is unreachable or ignores the
//! requested format.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use fruitlink_core::domain::buyer::BuyerDraft;
use fruitlink_core::domain::chat::ChatAction;
use fruitlink_core::domain::supplier::SupplierDraft;

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_`|\r\n]").expect("markup regex is valid"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));
static FRUIT_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:[,;]|\s(?:and|&)\s)\s*").expect("fruit separator regex is valid")
});
static STOP_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:supplier\s*name|buyer\s*name|country|from|products?|fruits\s+(?:importing|interested)|offering|offers|selling|interested\s+in)\b",
    )
    .expect("stop word regex is valid")
});

static SUPPLIER_COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:add|create)\s+supplier\s+(?P<name>.+?)\s+from\s+(?P<country>.+?)\s+(?:offering|offers|selling|with)\s+(?P<fruits>.+)$",
    )
    .expect("supplier command regex is valid")
});
static BUYER_COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:add|create)\s+buyer\s+(?P<name>.+?)(?:\s+from\s+(?P<country>.+?))?\s+interested\s+in\s+(?P<fruits>.+)$",
    )
    .expect("buyer command regex is valid")
});

static SUPPLIER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:supplier\s*name|name\s+is|\bname)[:\s]*([A-Za-z0-9&'.\- ]+)")
        .expect("supplier name regex is valid")
});
static BUYER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:buyer\s*name|name\s+is|\bname)[:\s]*([A-Za-z0-9&'.\- ]+)")
        .expect("buyer name regex is valid")
});
static COUNTRY_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcountry[:\s]*([A-Za-z0-9&'.\- ]+)").expect("country label regex is valid")
});
static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfrom\s+([A-Za-z0-9&'.\- ]+)").expect("from regex is valid")
});
static SUPPLIER_FRUITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\bproducts?(?:\(s\))?(?:\s+imported)?|fruits\s+importing\s+is|\boffering)[:\s]*([A-Za-z0-9,&'\- ]+)",
    )
    .expect("supplier fruits regex is valid")
});
static BUYER_FRUITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\bproducts?(?:\(s\))?(?:\s+interested(?:\s+in)?)?|fruits\s+interested\s+in|\binterested\s+in)[:\s]*([A-Za-z0-9,&'\- ]+)",
    )
    .expect("buyer fruits regex is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    Supplier,
    Buyer,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supplier => "supplier",
            Self::Buyer => "buyer",
        }
    }

    pub fn requires_country(&self) -> bool {
        matches!(self, Self::Supplier)
    }
}

/// Fields recovered from one source. Any of them may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedProfile {
    pub name: Option<String>,
    pub country: Option<String>,
    pub fruits: Vec<String>,
}

impl ExtractedProfile {
    pub fn missing_fields(&self, kind: ProfileKind) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if kind.requires_country() && self.country.is_none() {
            missing.push("country");
        }
        if self.fruits.is_empty() {
            missing.push("fruits");
        }
        missing
    }

    pub fn is_complete(&self, kind: ProfileKind) -> bool {
        self.missing_fields(kind).is_empty()
    }

    /// Fills fields missing here from `other`.
    pub fn merge(self, other: &ExtractedProfile) -> Self {
        Self {
            name: self.name.or_else(|| other.name.clone()),
            country: self.country.or_else(|| other.country.clone()),
            fruits: if self.fruits.is_empty() { other.fruits.clone() } else { self.fruits },
        }
    }

    pub fn field_count(&self) -> usize {
        usize::from(self.name.is_some())
            + usize::from(self.country.is_some())
            + usize::from(!self.fruits.is_empty())
    }

    /// The creation action for a complete profile; `None` while fields are missing.
    pub fn into_action(self, kind: ProfileKind) -> Option<ChatAction> {
        if !self.is_complete(kind) {
            return None;
        }
        let name = self.name.unwrap_or_default();
        let country = self.country.unwrap_or_default();
        Some(match kind {
            ProfileKind::Supplier => {
                ChatAction::AddSupplier(SupplierDraft::new(name, country, self.fruits))
            }
            ProfileKind::Buyer => ChatAction::AddBuyer(BuyerDraft::new(name, country, self.fruits)),
        })
    }
}

#[derive(Deserialize)]
struct JsonProfile {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    country: Option<Value>,
    #[serde(default)]
    fruits: Option<Value>,
}

fn text_field(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) => non_empty(&text),
        _ => None,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Reads the first well-formed JSON object of a model reply, ignoring markdown
/// fences and any prose around it. Returns `None` when no object parses.
pub fn parse_json_profile(reply: &str) -> Option<ExtractedProfile> {
    let unfenced = reply.replace("```json", "").replace("```", "");
    let parsed = unfenced.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&unfenced[start..])
            .into_iter::<JsonProfile>()
            .next()?
            .ok()
    })?;
    let fruits = match parsed.fruits {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(split_fruits)
            .collect(),
        Some(Value::String(text)) => split_fruits(&text),
        _ => Vec::new(),
    };

    Some(ExtractedProfile {
        name: text_field(parsed.name),
        country: text_field(parsed.country),
        fruits,
    })
}

/// Strips markdown emphasis, table pipes and line breaks, then collapses whitespace.
pub fn clean_text(text: &str) -> String {
    let stripped = MARKUP_RE.replace_all(text, " ");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Splits a fruit phrase on commas, semicolons, `and` and `&`. Labels are
/// lowercased; multi-word labels such as `passion fruit` stay intact.
pub fn split_fruits(text: &str) -> Vec<String> {
    let sentence = text.split(['.', '!', '?']).next().unwrap_or_default();
    FRUIT_SEPARATOR_RE
        .split(sentence)
        .map(|fruit| {
            let fruit = fruit.trim().to_lowercase();
            fruit.strip_prefix("and ").map(str::to_string).unwrap_or(fruit)
        })
        .map(|fruit| fruit.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|fruit| !fruit.is_empty() && fruit != "and")
        .collect()
}

fn truncate_at_stop_word(capture: &str) -> Option<String> {
    let end = STOP_WORD_RE.find(capture).map_or(capture.len(), |found| found.start());
    non_empty(capture[..end].trim().trim_end_matches(['.', ',', ':', ';', '-']))
}

fn labelled(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|capture| truncate_at_stop_word(capture.as_str()))
}

/// Regex extraction for model replies and raw chat messages.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalExtractor;

impl LocalExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, kind: ProfileKind, text: &str) -> ExtractedProfile {
        let clean = clean_text(text);
        let command = self.extract_command(kind, &clean);
        if command.is_complete(kind) {
            return command;
        }
        self.extract_labelled(kind, &clean).merge(&command)
    }

    /// `add supplier X from Y offering A and B` / `add buyer X [from Y] interested in A, B`.
    fn extract_command(&self, kind: ProfileKind, clean: &str) -> ExtractedProfile {
        let regex = match kind {
            ProfileKind::Supplier => &*SUPPLIER_COMMAND_RE,
            ProfileKind::Buyer => &*BUYER_COMMAND_RE,
        };
        let Some(captures) = regex.captures(clean) else {
            return ExtractedProfile::default();
        };

        ExtractedProfile {
            name: captures.name("name").and_then(|name| non_empty(name.as_str())),
            country: captures
                .name("country")
                .and_then(|country| non_empty(country.as_str().trim_end_matches(','))),
            fruits: captures.name("fruits").map(|fruits| split_fruits(fruits.as_str())).unwrap_or_default(),
        }
    }

    /// Labelled replies such as `Supplier Name: X Country: Y Products: A, B`.
    fn extract_labelled(&self, kind: ProfileKind, clean: &str) -> ExtractedProfile {
        let (name_re, fruits_re) = match kind {
            ProfileKind::Supplier => (&*SUPPLIER_NAME_RE, &*SUPPLIER_FRUITS_RE),
            ProfileKind::Buyer => (&*BUYER_NAME_RE, &*BUYER_FRUITS_RE),
        };

        let fruits = fruits_re
            .captures(clean)
            .and_then(|captures| captures.get(1))
            .and_then(|capture| truncate_at_stop_word(capture.as_str()))
            .map(|phrase| split_fruits(&phrase))
            .unwrap_or_default();

        ExtractedProfile {
            name: labelled(name_re, clean),
            country: labelled(&COUNTRY_LABEL_RE, clean).or_else(|| labelled(&FROM_RE, clean)),
            fruits,
        }
    }
}
