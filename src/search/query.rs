use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 500;

/// Result of parsing free text with optional quoted-phrase grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub terms: Vec<String>,
    pub phrases: Vec<String>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }
}

/// Parse raw query text into independent terms and literal phrases.
///
/// Text wrapped in matching double quotes becomes a phrase that must match
/// contiguously against the targeted field. An unterminated quote is not an
/// error: the remainder is tokenized as plain terms.
pub fn parse(raw: &str) -> ParsedQuery {
    let mut result = ParsedQuery::default();
    let mut rest = raw;

    while let Some(open) = rest.find('"') {
        let (before, quoted) = rest.split_at(open);
        push_terms(&mut result.terms, before);

        match quoted[1..].find('"') {
            Some(close) => {
                let phrase = quoted[1..1 + close].trim();
                if !phrase.is_empty() {
                    result.phrases.push(phrase.to_lowercase());
                }
                rest = &quoted[close + 2..];
            }
            None => {
                // Unterminated quote: degrade to literal text.
                push_terms(&mut result.terms, &quoted[1..]);
                rest = "";
            }
        }
    }
    push_terms(&mut result.terms, rest);

    result
}

fn push_terms(terms: &mut Vec<String>, text: &str) {
    terms.extend(
        text.split_whitespace()
            .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase),
    );
}

/// Normalized search input consumed by the pager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: ParsedQuery,
    pub creator: Option<ParsedQuery>,
    pub license: Option<String>,
    pub license_groups: Vec<String>,
    pub source: Option<String>,
    pub extension: Option<String>,
    pub filter_dead: bool,
    pub page: usize,
    pub page_size: usize,
}

/// Raw request parameters before validation, as the HTTP layer sees them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchParams {
    pub q: Option<String>,
    pub creator: Option<String>,
    pub license: Option<String>,
    pub license_type: Option<String>,
    pub source: Option<String>,
    pub extension: Option<String>,
    pub filter_dead: Option<bool>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl SearchRequest {
    /// Validate and normalize raw parameters.
    ///
    /// Bounds are checked here, before any index access: page must be >= 1
    /// and page_size within `[1, MAX_PAGE_SIZE]`.
    pub fn from_params(params: RawSearchParams) -> Result<Self, String> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err("page must be greater than or equal to 1".into());
        }

        let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(format!("page_size must be between 1 and {MAX_PAGE_SIZE}"));
        }

        Ok(Self {
            query: parse(params.q.as_deref().unwrap_or_default()),
            creator: params
                .creator
                .as_deref()
                .map(parse)
                .filter(|parsed| !parsed.is_empty()),
            license: normalize_token(params.license),
            license_groups: params
                .license_type
                .as_deref()
                .map(parse_csv)
                .unwrap_or_default(),
            source: normalize_token(params.source),
            extension: normalize_token(params.extension),
            // Dead links are hidden unless the caller explicitly opts in.
            filter_dead: params.filter_dead.unwrap_or(true),
            page,
            page_size,
        })
    }
}

fn normalize_token(raw: Option<String>) -> Option<String> {
    raw.map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}
