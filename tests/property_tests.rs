//! Property-based tests for URL parsing and validated identifiers.

use proptest::prelude::*;

use repomirror::core::types::{RecordId, RefName};
use repomirror::core::url::{parse_github_url, RepoSlug};

fn owner() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9-]{0,38}"
}

fn repo() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-][A-Za-z0-9._-]{0,40}".prop_filter("ends with .git", |r| !r.ends_with(".git"))
}

proptest! {
    #[test]
    fn url_forms_agree(owner in owner(), repo in repo()) {
        let expected = RepoSlug::new(owner.clone(), repo.clone());

        let https = format!("https://github.com/{}/{}", owner, repo);
        let https_git = format!("https://github.com/{}/{}.git", owner, repo);
        let ssh = format!("git@github.com:{}/{}.git", owner, repo);

        prop_assert_eq!(parse_github_url(&https), Ok(expected.clone()));
        prop_assert_eq!(parse_github_url(&https_git), Ok(expected.clone()));
        prop_assert_eq!(parse_github_url(&ssh), Ok(expected));
    }

    #[test]
    fn trailing_path_is_ignored(owner in owner(), repo in repo(), tail in "[a-z/]{0,20}") {
        let url = format!("https://github.com/{}/{}/{}", owner, repo, tail);
        let slug = parse_github_url(&url).unwrap();
        prop_assert_eq!(slug.owner, owner);
        prop_assert_eq!(slug.repo, repo);
    }

    #[test]
    fn ssh_scheme_prefix_accepted(owner in owner(), repo in repo()) {
        let url = format!("ssh://git@github.com:{}/{}.git", owner, repo);
        prop_assert_eq!(parse_github_url(&url), Ok(RepoSlug::new(owner, repo)));
    }

    #[test]
    fn colon_form_elsewhere_rejected(owner in owner(), repo in repo(), port in 1u16..=65535) {
        let with_port = format!("https://github.com:{}/{}/{}", port, owner, repo);
        let in_query = format!("https://evil.example/?next=github.com:{}/{}", owner, repo);
        let in_path = format!("https://evil.example/git@github.com:{}/{}", owner, repo);

        prop_assert!(parse_github_url(&with_port).is_err());
        prop_assert!(parse_github_url(&in_query).is_err());
        prop_assert!(parse_github_url(&in_path).is_err());
    }

    #[test]
    fn query_is_not_searched(owner in owner(), repo in repo()) {
        let url = format!("https://evil.example/?next=github.com/{}/{}", owner, repo);
        prop_assert!(parse_github_url(&url).is_err());
    }

    #[test]
    fn other_hosts_rejected(owner in owner(), repo in repo()) {
        let url = format!("https://gitlab.com/{}/{}", owner, repo);
        prop_assert!(parse_github_url(&url).is_err());
    }

    #[test]
    fn parse_never_panics(input in ".*") {
        let _ = parse_github_url(&input);
    }

    #[test]
    fn parsed_slug_is_never_empty(input in ".*github\\.com[/:].*") {
        if let Ok(slug) = parse_github_url(&input) {
            prop_assert!(!slug.owner.is_empty());
            prop_assert!(!slug.repo.is_empty());
        }
    }

    #[test]
    fn record_ids_never_contain_separators(id in ".{0,40}") {
        if let Ok(parsed) = RecordId::new(id.clone()) {
            prop_assert!(!parsed.as_str().contains('/'));
            prop_assert!(!parsed.as_str().contains('\\'));
            prop_assert!(!parsed.as_str().contains(".."));
            prop_assert_eq!(parsed.as_str(), id.as_str());
        }
    }

    #[test]
    fn simple_branch_names_are_valid_refs(branch in "[a-z][a-z0-9_-]{0,20}(/[a-z][a-z0-9_-]{0,20})?") {
        let name = RefName::for_branch(&branch).unwrap();
        prop_assert_eq!(name.as_str(), format!("refs/heads/{}", branch));
        prop_assert_eq!(name.api_path(), format!("heads/{}", branch));
    }
}
