//! forge::mock
//!
//! Mock Git host for deterministic testing.
//!
//! # Design
//!
//! The mock keeps one object network shared by all repositories (like a
//! fork network on GitHub): commits and trees are stored globally by SHA,
//! while each repository tracks which commits it contains and its refs.
//! Creating a tree or commit whose content already exists yields the
//! existing SHA, so copying a commit between repositories reproduces the
//! source SHA just as git's content addressing does.
//!
//! Ref updates enforce fast-forward unless forced, using the recorded
//! parent links for ancestry.
//!
//! # Example
//!
//! ```
//! use repomirror::forge::mock::MockForge;
//! use repomirror::forge::GitHost;
//! use repomirror::core::url::RepoSlug;
//!
//! # tokio_test::block_on(async {
//! let alice = RepoSlug::new("alice", "demo");
//! let forge = MockForge::new();
//! forge.add_repo(&alice, "main");
//! forge.add_commit(&alice, "abc123", &[], "init");
//! forge.set_ref(&alice, "refs/heads/main", "abc123");
//!
//! let commits = forge.list_commits(&alice, 5).await.unwrap();
//! assert_eq!(commits[0].sha, "abc123");
//! # });
//! ```

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use super::traits::{
    Branch, CommitSummary, ForgeError, GitCommit, GitHost, GitRef, NewCommit, RepoInfo,
    Signature, Tree, TreeEntry, TreeEntryKind,
};
use crate::core::types::RefName;
use crate::core::url::RepoSlug;

/// Mock Git host for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockForge {
    inner: Arc<Mutex<MockForgeInner>>,
}

#[derive(Debug, Default)]
struct MockForgeInner {
    /// Commit objects by SHA, shared across repositories.
    commits: HashMap<String, GitCommit>,
    /// Tree entries by tree SHA, shared across repositories.
    trees: HashMap<String, Vec<TreeEntry>>,
    repos: HashMap<RepoSlug, MockRepo>,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Never reuse an existing commit on create; mint a new SHA instead.
    rewrite_commits: bool,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

#[derive(Debug, Default)]
struct MockRepo {
    default_branch: String,
    /// Commits reachable in this repository.
    commits: HashSet<String>,
    /// Full ref name -> commit SHA.
    refs: BTreeMap<String, String>,
    protected: HashSet<String>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetRepository(ForgeError),
    ListBranches(ForgeError),
    ListCommits(ForgeError),
    GetCommit(ForgeError),
    GetTree(ForgeError),
    CreateTree(ForgeError),
    CreateCommit(ForgeError),
    GetRef(ForgeError),
    CreateRef(ForgeError),
    UpdateRef(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetRepository {
        repo: RepoSlug,
    },
    ListBranches {
        repo: RepoSlug,
    },
    ListCommits {
        repo: RepoSlug,
        per_page: u8,
    },
    GetCommit {
        repo: RepoSlug,
        sha: String,
    },
    GetTree {
        repo: RepoSlug,
        sha: String,
        recursive: bool,
    },
    CreateTree {
        repo: RepoSlug,
        entries: usize,
    },
    CreateCommit {
        repo: RepoSlug,
        tree_sha: String,
    },
    GetRef {
        repo: RepoSlug,
        name: String,
    },
    CreateRef {
        repo: RepoSlug,
        name: String,
        sha: String,
    },
    UpdateRef {
        repo: RepoSlug,
        name: String,
        sha: String,
        force: bool,
    },
}

impl MockOperation {
    /// Whether this operation writes to the host.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            MockOperation::CreateTree { .. }
                | MockOperation::CreateCommit { .. }
                | MockOperation::CreateRef { .. }
                | MockOperation::UpdateRef { .. }
        )
    }
}

fn not_found() -> ForgeError {
    ForgeError::NotFound("Not Found".into())
}

fn unprocessable(message: &str) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: message.into(),
    }
}

fn content_sha(content: &impl Hash) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

impl MockForge {
    /// Create a new empty mock host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use repomirror::forge::mock::{MockForge, FailOn};
    /// use repomirror::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::ListCommits(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
        self
    }

    /// Give every created commit a SHA of its own, as GitHub does when a
    /// copied commit loses its signature.
    pub fn rewrite_created_commits(self) -> Self {
        self.inner.lock().unwrap().rewrite_commits = true;
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.inner.lock().unwrap().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.inner.lock().unwrap().operations.clear();
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Register an empty repository.
    pub fn add_repo(&self, repo: &RepoSlug, default_branch: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.repos.insert(
            repo.clone(),
            MockRepo {
                default_branch: default_branch.to_string(),
                ..Default::default()
            },
        );
    }

    /// Add a commit with a one-file tree to a repository.
    ///
    /// The repository must have been registered with [`MockForge::add_repo`].
    pub fn add_commit(
        &self,
        repo: &RepoSlug,
        sha: &str,
        parents: &[&str],
        message: &str,
    ) -> GitCommit {
        let signature = Signature {
            name: "Mock Author".into(),
            email: "author@example.com".into(),
            date: "2024-05-01T10:00:00Z".into(),
        };
        let tree_sha = format!("tree-{}", sha);
        let commit = GitCommit {
            sha: sha.to_string(),
            message: message.to_string(),
            author: Some(signature.clone()),
            committer: Some(signature),
            tree_sha: tree_sha.clone(),
            parent_shas: parents.iter().map(|p| p.to_string()).collect(),
        };

        let mut inner = self.inner.lock().unwrap();
        inner.trees.insert(
            tree_sha,
            vec![TreeEntry {
                path: "README.md".into(),
                mode: "100644".into(),
                kind: TreeEntryKind::Blob,
                sha: format!("blob-{}", sha),
            }],
        );
        inner.commits.insert(sha.to_string(), commit.clone());
        if let Some(r) = inner.repos.get_mut(repo) {
            r.commits.insert(sha.to_string());
        }
        commit
    }

    /// Point a reference at a commit, bypassing all checks.
    pub fn set_ref(&self, repo: &RepoSlug, name: &str, sha: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(r) = inner.repos.get_mut(repo) {
            r.refs.insert(name.to_string(), sha.to_string());
        }
    }

    /// Mark a branch protected.
    pub fn protect_branch(&self, repo: &RepoSlug, branch: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(r) = inner.repos.get_mut(repo) {
            r.protected.insert(branch.to_string());
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// The commit a reference points at (for test verification).
    pub fn ref_target(&self, repo: &RepoSlug, name: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(repo).and_then(|r| r.refs.get(name).cloned())
    }

    /// Whether a repository contains a commit (for test verification).
    pub fn has_commit(&self, repo: &RepoSlug, sha: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(repo)
            .is_some_and(|r| r.commits.contains(sha))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn record(&self, op: MockOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }

    /// Return the configured error if `expected` names the failing method.
    fn check_fail(&self, expected: &str) -> Result<(), ForgeError> {
        let inner = self.inner.lock().unwrap();
        let err = match &inner.fail_on {
            Some(FailOn::GetRepository(e)) if expected == "get_repository" => e,
            Some(FailOn::ListBranches(e)) if expected == "list_branches" => e,
            Some(FailOn::ListCommits(e)) if expected == "list_commits" => e,
            Some(FailOn::GetCommit(e)) if expected == "get_commit" => e,
            Some(FailOn::GetTree(e)) if expected == "get_tree" => e,
            Some(FailOn::CreateTree(e)) if expected == "create_tree" => e,
            Some(FailOn::CreateCommit(e)) if expected == "create_commit" => e,
            Some(FailOn::GetRef(e)) if expected == "get_ref" => e,
            Some(FailOn::CreateRef(e)) if expected == "create_ref" => e,
            Some(FailOn::UpdateRef(e)) if expected == "update_ref" => e,
            _ => return Ok(()),
        };
        Err(err.clone())
    }
}

impl MockForgeInner {
    fn repo(&self, repo: &RepoSlug) -> Result<&MockRepo, ForgeError> {
        self.repos.get(repo).ok_or_else(not_found)
    }

    fn repo_mut(&mut self, repo: &RepoSlug) -> Result<&mut MockRepo, ForgeError> {
        self.repos.get_mut(repo).ok_or_else(not_found)
    }

    /// Whether `ancestor` is reachable from `descendant` via parent links.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let mut queue = VecDeque::from([descendant.to_string()]);
        let mut seen = HashSet::new();
        while let Some(sha) = queue.pop_front() {
            if sha == ancestor {
                return true;
            }
            if !seen.insert(sha.clone()) {
                continue;
            }
            if let Some(commit) = self.commits.get(&sha) {
                queue.extend(commit.parent_shas.iter().cloned());
            }
        }
        false
    }
}

#[async_trait]
impl GitHost for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_repository(&self, repo: &RepoSlug) -> Result<RepoInfo, ForgeError> {
        self.record(MockOperation::GetRepository { repo: repo.clone() });
        self.check_fail("get_repository")?;

        let inner = self.inner.lock().unwrap();
        let r = inner.repo(repo)?;
        Ok(RepoInfo {
            full_name: repo.to_string(),
            default_branch: r.default_branch.clone(),
        })
    }

    async fn list_branches(&self, repo: &RepoSlug) -> Result<Vec<Branch>, ForgeError> {
        self.record(MockOperation::ListBranches { repo: repo.clone() });
        self.check_fail("list_branches")?;

        let inner = self.inner.lock().unwrap();
        let r = inner.repo(repo)?;
        Ok(r.refs
            .iter()
            .filter_map(|(name, sha)| {
                let branch = name.strip_prefix("refs/heads/")?;
                Some(Branch {
                    name: branch.to_string(),
                    protected: r.protected.contains(branch),
                    sha: sha.clone(),
                })
            })
            .collect())
    }

    async fn list_commits(
        &self,
        repo: &RepoSlug,
        per_page: u8,
    ) -> Result<Vec<CommitSummary>, ForgeError> {
        self.record(MockOperation::ListCommits {
            repo: repo.clone(),
            per_page,
        });
        self.check_fail("list_commits")?;

        let inner = self.inner.lock().unwrap();
        let r = inner.repo(repo)?;
        let head = r.refs.get(&format!("refs/heads/{}", r.default_branch));

        // First-parent walk from the default branch.
        let mut summaries = Vec::new();
        let mut next = head.cloned();
        while let Some(sha) = next {
            if summaries.len() >= per_page as usize {
                break;
            }
            let Some(commit) = inner.commits.get(&sha) else {
                break;
            };
            summaries.push(CommitSummary {
                sha: commit.sha.clone(),
                message: commit.message.clone(),
                date: commit.author.as_ref().map(|a| a.date.clone()),
                author: commit.author.as_ref().map(|a| a.name.clone()),
            });
            next = commit.parent_shas.first().cloned();
        }
        Ok(summaries)
    }

    async fn get_commit(&self, repo: &RepoSlug, sha: &str) -> Result<GitCommit, ForgeError> {
        self.record(MockOperation::GetCommit {
            repo: repo.clone(),
            sha: sha.to_string(),
        });
        self.check_fail("get_commit")?;

        let inner = self.inner.lock().unwrap();
        if !inner.repo(repo)?.commits.contains(sha) {
            return Err(not_found());
        }
        inner.commits.get(sha).cloned().ok_or_else(not_found)
    }

    async fn get_tree(
        &self,
        repo: &RepoSlug,
        sha: &str,
        recursive: bool,
    ) -> Result<Tree, ForgeError> {
        self.record(MockOperation::GetTree {
            repo: repo.clone(),
            sha: sha.to_string(),
            recursive,
        });
        self.check_fail("get_tree")?;

        let inner = self.inner.lock().unwrap();
        inner.repo(repo)?;
        let entries = inner.trees.get(sha).cloned().ok_or_else(not_found)?;
        Ok(Tree {
            sha: sha.to_string(),
            entries,
            truncated: false,
        })
    }

    async fn create_tree(
        &self,
        repo: &RepoSlug,
        entries: &[TreeEntry],
    ) -> Result<String, ForgeError> {
        self.record(MockOperation::CreateTree {
            repo: repo.clone(),
            entries: entries.len(),
        });
        self.check_fail("create_tree")?;

        let mut inner = self.inner.lock().unwrap();
        inner.repo(repo)?;
        if let Some((sha, _)) = inner.trees.iter().find(|(_, e)| e.as_slice() == entries) {
            return Ok(sha.clone());
        }
        let sha = content_sha(&entries);
        inner.trees.insert(sha.clone(), entries.to_vec());
        Ok(sha)
    }

    async fn create_commit(
        &self,
        repo: &RepoSlug,
        commit: &NewCommit,
    ) -> Result<GitCommit, ForgeError> {
        self.record(MockOperation::CreateCommit {
            repo: repo.clone(),
            tree_sha: commit.tree_sha.clone(),
        });
        self.check_fail("create_commit")?;

        let mut inner = self.inner.lock().unwrap();
        inner.repo(repo)?;
        if !inner.trees.contains_key(&commit.tree_sha) {
            return Err(unprocessable("Tree SHA does not exist"));
        }

        let rewrite = inner.rewrite_commits;
        let sha = if rewrite {
            content_sha(&("rewritten", commit_key(commit)))
        } else {
            content_sha(&commit_key(commit))
        };
        let existing = inner
            .commits
            .values()
            .find(|c| {
                (!rewrite || c.sha == sha)
                    && c.tree_sha == commit.tree_sha
                    && c.parent_shas == commit.parent_shas
                    && c.message == commit.message
                    && c.author == commit.author
                    && c.committer == commit.committer
            })
            .cloned();
        let created = match existing {
            Some(c) => c,
            None => {
                let c = GitCommit {
                    sha,
                    message: commit.message.clone(),
                    author: commit.author.clone(),
                    committer: commit.committer.clone(),
                    tree_sha: commit.tree_sha.clone(),
                    parent_shas: commit.parent_shas.clone(),
                };
                inner.commits.insert(c.sha.clone(), c.clone());
                c
            }
        };
        inner.repo_mut(repo)?.commits.insert(created.sha.clone());
        Ok(created)
    }

    async fn get_ref(&self, repo: &RepoSlug, name: &RefName) -> Result<GitRef, ForgeError> {
        self.record(MockOperation::GetRef {
            repo: repo.clone(),
            name: name.to_string(),
        });
        self.check_fail("get_ref")?;

        let inner = self.inner.lock().unwrap();
        let sha = inner
            .repo(repo)?
            .refs
            .get(name.as_str())
            .cloned()
            .ok_or_else(not_found)?;
        Ok(GitRef {
            name: name.clone(),
            sha,
        })
    }

    async fn create_ref(
        &self,
        repo: &RepoSlug,
        name: &RefName,
        sha: &str,
    ) -> Result<GitRef, ForgeError> {
        self.record(MockOperation::CreateRef {
            repo: repo.clone(),
            name: name.to_string(),
            sha: sha.to_string(),
        });
        self.check_fail("create_ref")?;

        let mut inner = self.inner.lock().unwrap();
        let r = inner.repo_mut(repo)?;
        if r.refs.contains_key(name.as_str()) {
            return Err(unprocessable("Reference already exists"));
        }
        if !r.commits.contains(sha) {
            return Err(unprocessable("Object does not exist"));
        }
        r.refs.insert(name.to_string(), sha.to_string());
        Ok(GitRef {
            name: name.clone(),
            sha: sha.to_string(),
        })
    }

    async fn update_ref(
        &self,
        repo: &RepoSlug,
        name: &RefName,
        sha: &str,
        force: bool,
    ) -> Result<GitRef, ForgeError> {
        self.record(MockOperation::UpdateRef {
            repo: repo.clone(),
            name: name.to_string(),
            sha: sha.to_string(),
            force,
        });
        self.check_fail("update_ref")?;

        let mut inner = self.inner.lock().unwrap();
        let r = inner.repo(repo)?;
        let current = r
            .refs
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| unprocessable("Reference does not exist"))?;
        if !r.commits.contains(sha) {
            return Err(unprocessable("Object does not exist"));
        }
        if !force && current != sha && !inner.is_ancestor(&current, sha) {
            return Err(unprocessable("Update is not a fast forward"));
        }

        inner
            .repo_mut(repo)?
            .refs
            .insert(name.to_string(), sha.to_string());
        Ok(GitRef {
            name: name.clone(),
            sha: sha.to_string(),
        })
    }
}

/// Hashable identity of a commit request.
fn commit_key(commit: &NewCommit) -> impl Hash + '_ {
    (
        &commit.message,
        &commit.tree_sha,
        &commit.parent_shas,
        &commit.author,
        &commit.committer,
    )
}
