//! `Link` header parsing (RFC 8288).

/// LDP type marking binary resources.
pub const NON_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#NonRDFSource";

/// One link-value: a target URI and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkValue {
    pub target: String,
    pub params: Vec<(String, String)>,
}

impl LinkValue {
    /// Value of the first parameter named `name` (case-insensitive).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether `rel` lists `relation`. `rel` may hold several
    /// space-separated relation types.
    pub fn has_rel(&self, relation: &str) -> bool {
        self.param("rel")
            .map(|rels| rels.split_ascii_whitespace().any(|r| r == relation))
            .unwrap_or(false)
    }
}

/// Parses one `Link` header value, which may hold several comma-separated
/// link-values. Malformed entries are skipped.
pub fn parse(header: &str) -> Vec<LinkValue> {
    let mut links = Vec::new();
    let mut rest = header;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        let Some(after_open) = rest.strip_prefix('<') else {
            break;
        };
        let Some((target, after_target)) = after_open.split_once('>') else {
            break;
        };

        let (params, remaining) = parse_params(after_target);
        links.push(LinkValue {
            target: target.trim().to_string(),
            params,
        });
        rest = remaining;
    }

    links
}

/// Parses `; key=value; key="quoted, value"` up to the next top-level comma.
fn parse_params(input: &str) -> (Vec<(String, String)>, &str) {
    let mut params = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        let Some(after_semi) = rest.strip_prefix(';') else {
            return (params, rest);
        };
        let after_semi = after_semi.trim_start();

        let key_end = after_semi
            .find(|c: char| c == '=' || c == ';' || c == ',')
            .unwrap_or(after_semi.len());
        let key = after_semi[..key_end].trim().to_ascii_lowercase();
        rest = &after_semi[key_end..];

        let value = match rest.strip_prefix('=') {
            Some(after_eq) => {
                let after_eq = after_eq.trim_start();
                if let Some(quoted) = after_eq.strip_prefix('"') {
                    let end = quoted.find('"').unwrap_or(quoted.len());
                    rest = quoted.get(end + 1..).unwrap_or_default();
                    quoted[..end].to_string()
                } else {
                    let end = after_eq
                        .find(|c: char| c == ';' || c == ',')
                        .unwrap_or(after_eq.len());
                    rest = &after_eq[end..];
                    after_eq[..end].trim().to_string()
                }
            }
            None => String::new(),
        };

        if !key.is_empty() {
            params.push((key, value));
        }
    }
}

/// Whether any of the `Link` header values marks the resource as an LDP
/// NonRDFSource.
pub fn is_non_rdf_source<'a>(headers: impl IntoIterator<Item = &'a str>) -> bool {
    headers
        .into_iter()
        .flat_map(parse)
        .any(|link| link.target == NON_RDF_SOURCE && link.has_rel("type"))
}
