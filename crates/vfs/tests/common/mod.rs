//! Shared fixture: a real repository with seven commits of linear history
//! over an `assets/` directory, authored through the tree editor so no
//! worktree checkout is involved.

#![allow(dead_code)]

use std::path::Path;

use gix::ObjectId;

/// The fixture's commits, oldest first.
pub struct FixtureHistory {
    pub commits: Vec<ObjectId>,
}

impl FixtureHistory {
    /// Commit by scenario step (0 = root commit).
    pub fn step(&self, index: usize) -> ObjectId {
        self.commits[index]
    }

    /// The newest commit, i.e. `HEAD`.
    pub fn head(&self) -> ObjectId {
        *self.commits.last().unwrap()
    }
}

/// Initialize a repository at `dir` and author the scenario history:
///
/// 0. add `assets/A` and `assets/B`
/// 1. add `assets/space`
/// 2. modify `assets/A` and `assets/B`
/// 3. add `assets/C`, `assets/D` and `assets/E`
/// 4. remove `assets/E`
/// 5. add `groups.plist` at the repository root
/// 6. modify `assets/C`
pub fn seeded_repo(dir: &Path) -> FixtureHistory {
    gix::init(dir).unwrap();
    write_committer_identity(dir);
    let repo = gix::open(dir).unwrap();
    // The view tests open this directory directly, so it must exist on disk.
    std::fs::create_dir(dir.join("assets")).unwrap();

    let mut commits = Vec::new();
    let mut parent = None;

    let steps: [(&str, &[(&str, &str)], &[&str]); 7] = [
        (
            "add A and B",
            &[("assets/A", "A v1"), ("assets/B", "B v1")],
            &[],
        ),
        ("add space", &[("assets/space", "space v1")], &[]),
        (
            "modify A and B",
            &[("assets/A", "A v2"), ("assets/B", "B v2")],
            &[],
        ),
        (
            "add C, D and E",
            &[
                ("assets/C", "C v1"),
                ("assets/D", "D v1"),
                ("assets/E", "E v1"),
            ],
            &[],
        ),
        ("remove E", &[], &["assets/E"]),
        ("add groups", &[("groups.plist", "<plist/>")], &[]),
        ("modify C", &[("assets/C", "C v2")], &[]),
    ];

    for (message, writes, removes) in steps {
        let id = commit_step(&repo, parent, message, writes, removes);
        commits.push(id);
        parent = Some(id);
    }

    FixtureHistory { commits }
}

/// Message of each scenario step, in the same order as the commits.
pub fn scenario_messages() -> Vec<&'static str> {
    vec![
        "add A and B",
        "add space",
        "modify A and B",
        "add C, D and E",
        "remove E",
        "add groups",
        "modify C",
    ]
}

/// Author one more commit on top of `parent` in an already seeded
/// repository, touching a file named after the message.
pub fn append_commit(dir: &Path, parent: ObjectId, message: &str) -> ObjectId {
    let repo = gix::open(dir).unwrap();
    commit_step(
        &repo,
        Some(parent),
        message,
        &[("assets/appended", message)],
        &[],
    )
}

/// Commits need a committer; append one to the repository config.
fn write_committer_identity(dir: &Path) {
    use std::io::Write;
    let mut config = std::fs::OpenOptions::new()
        .append(true)
        .open(dir.join(".git").join("config"))
        .unwrap();
    writeln!(config, "[user]\n\tname = fixture\n\temail = fixture@example.com").unwrap();
}

fn commit_step(
    repo: &gix::Repository,
    parent: Option<ObjectId>,
    message: &str,
    writes: &[(&str, &str)],
    removes: &[&str],
) -> ObjectId {
    let base_tree = match parent {
        Some(parent) => repo.find_commit(parent).unwrap().tree_id().unwrap().detach(),
        None => repo.empty_tree().id,
    };
    let mut editor = repo.edit_tree(base_tree).unwrap();
    for (path, contents) in writes {
        let blob = repo.write_blob(contents.as_bytes()).unwrap();
        editor
            .upsert(*path, gix::object::tree::EntryKind::Blob, blob.detach())
            .unwrap();
    }
    for path in removes {
        editor.remove(*path).unwrap();
    }
    let tree = editor.write().unwrap();
    repo.commit("HEAD", message, tree.detach(), parent)
        .unwrap()
        .detach()
}
