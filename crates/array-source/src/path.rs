use crate::error::SourceError;

/// The `esdm://` source-path grammar from `spec.md` §6: `esdm://<container>/`
/// (or an equivalent prefix per adapter), with any `..` path component
/// rejected outright.
pub const SCHEME_PREFIX: &str = "esdm://";

/// A parsed source path: the container name and the remaining path, if any.
#[derive(Debug, PartialEq, Eq)]
pub struct SourcePath<'a> {
    pub container: &'a str,
    pub rest: &'a str,
}

pub fn parse_source_path(path: &str) -> Result<SourcePath<'_>, SourceError> {
    let Some(without_scheme) = path.strip_prefix(SCHEME_PREFIX) else {
        return Err(SourceError::InvalidPath(
            path.to_owned(),
            "missing `esdm://` prefix",
        ));
    };
    if path.contains("..") {
        return Err(SourceError::InvalidPath(
            path.to_owned(),
            "path must not contain `..`",
        ));
    }
    let (container, rest) = match without_scheme.split_once('/') {
        Some((c, r)) => (c, r),
        None => (without_scheme, ""),
    };
    if container.is_empty() {
        return Err(SourceError::InvalidPath(path.to_owned(), "empty container name"));
    }
    Ok(SourcePath { container, rest })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_container_and_rest() {
        let p = parse_source_path("esdm://mycontainer/measure").unwrap();
        assert_eq!(p.container, "mycontainer");
        assert_eq!(p.rest, "measure");
    }

    #[test]
    fn parses_container_only() {
        let p = parse_source_path("esdm://mycontainer/").unwrap();
        assert_eq!(p.container, "mycontainer");
        assert_eq!(p.rest, "");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(parse_source_path("mycontainer/measure").is_err());
    }

    #[test]
    fn rejects_dotdot() {
        assert!(parse_source_path("esdm://mycontainer/../etc").is_err());
        assert!(parse_source_path("esdm://../mycontainer").is_err());
    }

    #[test]
    fn rejects_empty_container() {
        assert!(parse_source_path("esdm:///measure").is_err());
    }
}
