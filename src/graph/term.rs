//! RDF term and triple types.
//!
//! Terms are the building blocks of triples. A term can be:
//! - An IRI (always absolute, never prefixed)
//! - A blank node (identifier local to one graph)
//! - A literal (lexical value, datatype IRI, optional language tag)

use std::fmt;
use std::sync::Arc;

/// XSD string, the datatype of plain literals.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// RDF language-tagged string datatype.
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// An RDF term.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// Absolute IRI
    Iri(Arc<str>),
    /// Blank node label, without the `_:` prefix
    BlankNode(Arc<str>),
    /// Literal value
    Literal {
        /// Lexical form
        value: Arc<str>,
        /// Datatype IRI
        datatype: Arc<str>,
        /// Language tag for `rdf:langString` literals
        language: Option<Arc<str>>,
    },
}

impl Term {
    /// Create an IRI term.
    pub fn iri(iri: impl AsRef<str>) -> Self {
        Term::Iri(Arc::from(iri.as_ref()))
    }

    /// Create a blank node term (label without `_:`).
    pub fn blank(label: impl AsRef<str>) -> Self {
        Term::BlankNode(Arc::from(label.as_ref()))
    }

    /// Create an `xsd:string` literal.
    pub fn literal(value: impl AsRef<str>) -> Self {
        Self::typed_literal(value, XSD_STRING)
    }

    /// Create a literal with an explicit datatype.
    pub fn typed_literal(value: impl AsRef<str>, datatype: impl AsRef<str>) -> Self {
        Term::Literal {
            value: Arc::from(value.as_ref()),
            datatype: Arc::from(datatype.as_ref()),
            language: None,
        }
    }

    /// Create a language-tagged literal.
    pub fn lang_literal(value: impl AsRef<str>, language: impl AsRef<str>) -> Self {
        Term::Literal {
            value: Arc::from(value.as_ref()),
            datatype: Arc::from(RDF_LANG_STRING),
            language: Some(Arc::from(language.as_ref())),
        }
    }

    /// The IRI, if this term is one.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// True for IRIs.
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    /// True for blank nodes.
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Lexical value of a literal.
    pub fn literal_value(&self) -> Option<&str> {
        match self {
            Term::Literal { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::BlankNode(label) => write!(f, "_:{}", label),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "{:?}", value.as_ref())?;
                match language {
                    Some(lang) => write!(f, "@{}", lang),
                    None if datatype.as_ref() == XSD_STRING => Ok(()),
                    None => write!(f, "^^<{}>", datatype),
                }
            }
        }
    }
}

/// A subject-predicate-object statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    /// Subject (IRI or blank node)
    pub subject: Term,
    /// Predicate (IRI)
    pub predicate: Term,
    /// Object
    pub object: Term,
}

impl Triple {
    /// Create a triple.
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// True when every bound position equals the corresponding term.
    pub fn matches(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> bool {
        s.map_or(true, |s| &self.subject == s)
            && p.map_or(true, |p| &self.predicate == p)
            && o.map_or(true, |o| &self.object == o)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
