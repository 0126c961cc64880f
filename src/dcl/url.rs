//! URL templating

use super::error::Result;

/// Replaces each `{{key}}` in `template` with the percent-encoded value and
/// joins the result onto the base path. `user_base_path` wins when non-empty.
pub fn url(template: &str, base_path: &str, user_base_path: Option<&str>, params: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (key, value) in params {
        path = path.replace(&format!("{{{{{key}}}}}"), &urlencoding::encode(value));
    }
    let base = user_base_path.filter(|b| !b.is_empty()).unwrap_or(base_path);
    if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Appends query parameters, keeping any already present.
pub fn add_query_params(raw: &str, params: &[(&str, String)]) -> Result<String> {
    if params.is_empty() {
        return Ok(raw.to_string());
    }
    let mut parsed = url::Url::parse(raw)?;
    {
        let mut pairs = parsed.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_substitution() {
        let u = url(
            "projects/{{project}}/locations/{{location}}/lakes?lakeId={{name}}",
            "https://dataplex.googleapis.com/v1/",
            None,
            &[("project", "p"), ("location", "us-central1"), ("name", "lake 1")],
        );
        assert_eq!(
            u,
            "https://dataplex.googleapis.com/v1/projects/p/locations/us-central1/lakes?lakeId=lake%201"
        );
    }

    #[test]
    fn test_user_base_path_overrides() {
        let u = url("a/{{x}}", "https://default/v1/", Some("http://localhost:1234"), &[("x", "y")]);
        assert_eq!(u, "http://localhost:1234/a/y");
        let u = url("a", "https://default/v1/", Some(""), &[]);
        assert_eq!(u, "https://default/v1/a");
    }

    #[test]
    fn test_add_query_params() {
        let u = add_query_params(
            "https://x/v1/lakes?lakeId=a",
            &[("updateMask", "displayName,labels".to_string())],
        )
        .unwrap();
        assert_eq!(u, "https://x/v1/lakes?lakeId=a&updateMask=displayName%2Clabels");
        assert_eq!(add_query_params("https://x/", &[]).unwrap(), "https://x/");
    }
}
