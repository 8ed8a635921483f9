//! In-memory RDF graphs built from annotation server responses.
//!
//! A [`Graph`] is an ordered set of [`Triple`]s: duplicates are dropped on insert and
//! iteration follows insertion order, which for parsed responses is the order the
//! server sent the statements in.
//!
//! # Example
//!
//! ```
//! use triannon_client::graph::{vocab, Graph, Term, Triple};
//!
//! let mut graph = Graph::new();
//! graph.insert(Triple::new(
//!     Term::iri("http://example.org/annotations/1"),
//!     Term::iri(vocab::RDF_TYPE),
//!     Term::iri(vocab::OA_ANNOTATION),
//! ));
//!
//! let subjects = graph.subjects_of(&Term::iri(vocab::RDF_TYPE), &Term::iri(vocab::OA_ANNOTATION));
//! assert_eq!(subjects.len(), 1);
//! ```

mod parser;
mod term;

pub use parser::parse_graph;
pub use term::{Term, Triple, RDF_LANG_STRING, XSD_STRING};

use std::collections::HashSet;

/// Vocabulary IRIs the client queries for.
pub mod vocab {
    /// `rdf:type`
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// `oa:Annotation`
    pub const OA_ANNOTATION: &str = "http://www.w3.org/ns/oa#Annotation";
    /// `sc:AnnotationList` from the IIIF presentation API
    pub const IIIF_ANNOTATION_LIST: &str = "http://iiif.io/api/presentation/2#AnnotationList";
}

/// An ordered set of triples.
///
/// `oxrdf::Graph` is not used here because it does not keep insertion order, and
/// callers rely on `annotation_uris` following the order of the server's response.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple; returns false if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// True when the graph has no triples.
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// True when the triple is present.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.seen.contains(triple)
    }

    /// Iterate over triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples matching a pattern; `None` positions are wildcards.
    pub fn query<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Term>,
        object: Option<&'a Term>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.matches(subject, predicate, object))
    }

    /// Distinct subjects of `(?s, predicate, object)`, in graph order.
    pub fn subjects_of(&self, predicate: &Term, object: &Term) -> Vec<&Term> {
        let mut subjects: Vec<&Term> = Vec::new();
        let matching = self
            .triples
            .iter()
            .filter(|t| t.matches(None, Some(predicate), Some(object)));
        for triple in matching {
            if !subjects.contains(&&triple.subject) {
                subjects.push(&triple.subject);
            }
        }
        subjects
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Eq for Graph {}

impl Extend<Triple> for Graph {
    fn extend<T: IntoIterator<Item = Triple>>(&mut self, iter: T) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        let mut graph = Graph::new();
        graph.extend(iter);
        graph
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::slice::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}
