//! Conjunctive filter predicate over works.
//!
//! Structured filters compose into one predicate object evaluated against the
//! abstract index, independent of any storage engine.

use crate::{catalog::Work, licenses, search::query::SearchRequest};

/// All structured constraints of a request, evaluated as a conjunction.
#[derive(Debug, Clone, Default)]
pub struct WorkPredicate {
    terms: Vec<String>,
    phrases: Vec<String>,
    creator_terms: Vec<String>,
    creator_phrases: Vec<String>,
    license: Option<String>,
    license_groups: Vec<String>,
    source: Option<String>,
    extension: Option<String>,
}

impl WorkPredicate {
    pub fn from_request(request: &SearchRequest) -> Self {
        let (creator_terms, creator_phrases) = request
            .creator
            .as_ref()
            .map(|parsed| (parsed.terms.clone(), parsed.phrases.clone()))
            .unwrap_or_default();

        Self {
            terms: request.query.terms.clone(),
            phrases: request.query.phrases.clone(),
            creator_terms,
            creator_phrases,
            license: request.license.clone(),
            license_groups: request.license_groups.clone(),
            source: request.source.clone(),
            extension: request.extension.clone(),
        }
    }

    /// Predicate with no text constraints, used by the recommendation path.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn matches(&self, work: &Work) -> bool {
        self.matches_text(work)
            && self.matches_creator(work)
            && self.matches_license(work)
            && self.matches_source(work)
            && self.matches_extension(work)
    }

    /// Relevance score used by the index to rank matching works.
    ///
    /// Term-frequency sum over title, creator, and tags; phrases count once
    /// per occurrence. Ties are broken by the index, not here.
    pub fn relevance(&self, work: &Work) -> usize {
        let fields = field_texts(work);
        self.terms
            .iter()
            .chain(self.phrases.iter())
            .map(|needle| {
                fields
                    .iter()
                    .map(|field| field.matches(needle.as_str()).count())
                    .sum::<usize>()
            })
            .sum()
    }

    fn matches_text(&self, work: &Work) -> bool {
        let fields = field_texts(work);
        // The parser drops a lone `*`, so a wildcard query reaches us with no
        // terms and matches everything.
        self.terms
            .iter()
            .all(|term| fields.iter().any(|field| field.contains(term.as_str())))
            && self
                .phrases
                .iter()
                .all(|phrase| fields.iter().any(|field| field.contains(phrase.as_str())))
    }

    fn matches_creator(&self, work: &Work) -> bool {
        if self.creator_terms.is_empty() && self.creator_phrases.is_empty() {
            return true;
        }
        let Some(creator) = &work.creator else {
            return false;
        };
        let creator = creator.to_lowercase();

        self.creator_terms
            .iter()
            .all(|term| creator.contains(term.as_str()))
            && self
                .creator_phrases
                .iter()
                .all(|phrase| creator.contains(phrase.as_str()))
    }

    fn matches_license(&self, work: &Work) -> bool {
        if let Some(license) = &self.license {
            if !work.license.eq_ignore_ascii_case(license) {
                return false;
            }
        }
        licenses::in_all_groups(&work.license, &self.license_groups)
    }

    fn matches_source(&self, work: &Work) -> bool {
        self.source
            .as_ref()
            .is_none_or(|source| work.source.eq_ignore_ascii_case(source))
    }

    fn matches_extension(&self, work: &Work) -> bool {
        self.extension
            .as_ref()
            .is_none_or(|extension| work.extension.eq_ignore_ascii_case(extension))
    }
}

/// Lowercased per-field text a free-text query is matched against. Fields are
/// kept separate so a quoted phrase cannot match across a field boundary.
fn field_texts(work: &Work) -> Vec<String> {
    let mut fields = Vec::with_capacity(2 + work.tags.len());
    if let Some(title) = &work.title {
        fields.push(title.to_lowercase());
    }
    if let Some(creator) = &work.creator {
        fields.push(creator.to_lowercase());
    }
    fields.extend(work.tags.iter().map(|tag| tag.to_lowercase()));
    fields
}
