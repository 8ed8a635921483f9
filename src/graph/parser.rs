//! RDF parsing into [`Graph`]s.
//!
//! Parsing is delegated to `oxrdfio`; this module only maps parser terms into the
//! crate's own [`Term`] type. Statements from named graphs (N-Quads, TriG) are merged
//! into the single result graph.

use super::{Graph, Term, Triple};
use crate::error::{AnnotationError, Result};
use crate::protocol::MediaType;
use oxrdfio::RdfParser;

/// Parse a response body of the given serialization.
///
/// Relative IRIs are resolved against `base_iri` when provided.
///
/// # Errors
///
/// [`AnnotationError::Parse`] for syntax errors, an invalid base IRI or a media type
/// with no parser.
pub fn parse_graph(media_type: MediaType, body: &[u8], base_iri: Option<&str>) -> Result<Graph> {
    let format = media_type
        .rdf_format()
        .ok_or_else(|| AnnotationError::Parse(format!("no parser available for {}", media_type)))?;

    let mut parser = RdfParser::from_format(format);
    if let Some(base) = base_iri {
        parser = parser
            .with_base_iri(base)
            .map_err(|e| AnnotationError::Parse(format!("invalid base IRI {}: {}", base, e)))?;
    }

    let mut graph = Graph::new();
    for quad in parser.for_reader(body) {
        let quad = quad.map_err(|e| AnnotationError::Parse(e.to_string()))?;

        let subject: oxrdf::Term = quad.subject.into();
        let (Some(subject), Some(object)) = (convert_term(subject), convert_term(quad.object)) else {
            tracing::debug!("skipping statement with an unsupported term");
            continue;
        };
        graph.insert(Triple::new(subject, Term::iri(quad.predicate.as_str()), object));
    }

    Ok(graph)
}

fn convert_term(term: oxrdf::Term) -> Option<Term> {
    match term {
        oxrdf::Term::NamedNode(node) => Some(Term::iri(node.as_str())),
        oxrdf::Term::BlankNode(node) => Some(Term::blank(node.as_str())),
        oxrdf::Term::Literal(literal) => Some(match literal.language() {
            Some(language) => Term::lang_literal(literal.value(), language),
            None => Term::typed_literal(literal.value(), literal.datatype().as_str()),
        }),
        // Quoted triples only exist with RDF 1.2 enabled.
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::vocab;

    const TURTLE: &str = r#"
        @prefix oa: <http://www.w3.org/ns/oa#> .
        @prefix cnt: <http://www.w3.org/2011/content#> .
        <http://localhost:3000/annotations/foo/abc> a oa:Annotation ;
            oa:motivatedBy oa:commenting ;
            oa:hasTarget <http://purl.stanford.edu/kq131cs7229> ;
            oa:hasBody _:body .
        _:body cnt:chars "I love this!"@en .
    "#;

    #[test]
    fn test_parse_turtle() {
        let graph = parse_graph(MediaType::Turtle, TURTLE.as_bytes(), None).unwrap();
        assert_eq!(graph.len(), 5);
        let subjects = graph.subjects_of(&Term::iri(vocab::RDF_TYPE), &Term::iri(vocab::OA_ANNOTATION));
        assert_eq!(subjects, vec![&Term::iri("http://localhost:3000/annotations/foo/abc")]);
        assert!(graph
            .iter()
            .any(|t| t.object == Term::lang_literal("I love this!", "en")));
    }

    #[test]
    fn test_parse_ntriples_with_base() {
        let body = "<http://example.org/a> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/oa#Annotation> .\n";
        let graph = parse_graph(MediaType::NTriples, body.as_bytes(), Some("http://example.org/")).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_parse_turtle_relative_iri() {
        let body = "<abc> a <http://www.w3.org/ns/oa#Annotation> .";
        let graph = parse_graph(
            MediaType::Turtle,
            body.as_bytes(),
            Some("http://localhost:3000/annotations/foo/"),
        )
        .unwrap();
        let subjects = graph.subjects_of(&Term::iri(vocab::RDF_TYPE), &Term::iri(vocab::OA_ANNOTATION));
        assert_eq!(subjects[0].as_iri(), Some("http://localhost:3000/annotations/foo/abc"));
    }

    #[test]
    fn test_parse_jsonld_inline_context() {
        let body = r#"{
            "@context": {"oa": "http://www.w3.org/ns/oa#"},
            "@id": "http://localhost:3000/annotations/foo/abc",
            "@type": "oa:Annotation",
            "oa:hasTarget": {"@id": "http://purl.stanford.edu/kq131cs7229"}
        }"#;
        let graph = parse_graph(MediaType::JsonLd, body.as_bytes(), None).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_graph(MediaType::Turtle, b"this is not turtle", None).unwrap_err();
        assert!(matches!(err, AnnotationError::Parse(_)));
    }
}
