use std::fmt;

use crate::domain::ROOT_PAGE;
use crate::error::CoreError;

pub const MAX_PAGE_LEN: usize = 512;
pub const DYNAMIC_SEGMENT: &str = "[id]";

const MIN_HEX_ID_LEN: usize = 16;

/// Route path as stored in the visit log: no query or fragment, no repeated
/// or trailing slashes, and id-like segments collapsed to `[id]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PagePath(String);

impl PagePath {
    pub fn normalize(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
        let path = &trimmed[..end];
        if path.is_empty() {
            return Ok(PagePath(ROOT_PAGE.to_string()));
        }
        if path.len() > MAX_PAGE_LEN || !path.starts_with('/') {
            return Err(CoreError::InvalidPage(path.to_string()));
        }
        if path.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(CoreError::InvalidPage(path.to_string()));
        }

        let segments: Vec<&str> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                if is_dynamic_segment(segment) {
                    DYNAMIC_SEGMENT
                } else {
                    segment
                }
            })
            .collect();
        if segments.is_empty() {
            return Ok(PagePath(ROOT_PAGE.to_string()));
        }
        Ok(PagePath(format!("/{}", segments.join("/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_dynamic_segment(segment: &str) -> bool {
    if segment.chars().all(|ch| ch.is_ascii_digit()) {
        return true;
    }
    if is_uuid(segment) {
        return true;
    }
    segment.len() >= MIN_HEX_ID_LEN
        && segment.chars().all(|ch| ch.is_ascii_hexdigit())
        && segment.chars().any(|ch| ch.is_ascii_digit())
}

fn is_uuid(segment: &str) -> bool {
    let groups: Vec<&str> = segment.split('-').collect();
    let expected = [8, 4, 4, 4, 12];
    groups.len() == expected.len()
        && groups
            .iter()
            .zip(expected)
            .all(|(group, len)| group.len() == len && group.chars().all(|ch| ch.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_query_and_fragment() {
        let page = PagePath::normalize("/projects?tab=all#top").unwrap();
        assert_eq!(page.as_str(), "/projects");
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(PagePath::normalize("").unwrap().as_str(), "/");
        assert_eq!(PagePath::normalize("?utm=x").unwrap().as_str(), "/");
        assert_eq!(PagePath::normalize("///").unwrap().as_str(), "/");
    }

    #[test]
    fn collapses_slashes_and_trailing_slash() {
        let page = PagePath::normalize("//career//details/").unwrap();
        assert_eq!(page.as_str(), "/career/details");
    }

    #[test]
    fn collapses_dynamic_segments() {
        assert_eq!(
            PagePath::normalize("/projects/42").unwrap().as_str(),
            "/projects/[id]"
        );
        assert_eq!(
            PagePath::normalize("/projects/3f2504e0-4f89-11d3-9a0c-0305e82c3301/edit")
                .unwrap()
                .as_str(),
            "/projects/[id]/edit"
        );
        assert_eq!(
            PagePath::normalize("/uploads/65a1f0c2b3d4e5f6a7b8c9d0").unwrap().as_str(),
            "/uploads/[id]"
        );
    }

    #[test]
    fn keeps_word_segments() {
        let page = PagePath::normalize("/projects/deadbeef-blog").unwrap();
        assert_eq!(page.as_str(), "/projects/deadbeef-blog");
    }

    #[test]
    fn rejects_relative_and_whitespace() {
        assert!(PagePath::normalize("projects").is_err());
        assert!(PagePath::normalize("/about me").is_err());
    }

    #[test]
    fn rejects_overlong_path() {
        let raw = format!("/{}", "a".repeat(MAX_PAGE_LEN));
        assert!(PagePath::normalize(&raw).is_err());
    }
}
