
use nb::core::frontmatter;
use nb::core::model::{WorkspaceKind, WorkspaceNode};
use nb::core::{
    ContentSearch, FsNotebook, JsonWorkspaceRegistry, NoteService, NoteSource, NotebookError,
    Placement, RipgrepSearch, WorkspaceSource,
};
use std::fs;
use std::path::Path;
use test_utils::{temp_dir, write_note};

fn repo_a() -> Placement {
    Placement::new(Some("repo-a".to_string()), "current")
}

fn workspace_node(root: &Path, name: &str) -> WorkspaceNode {
    WorkspaceNode::new(
        name,
        root.join("workspaces").join(name),
        WorkspaceKind::Standalone,
    )
}

#[test]
fn create_writes_frontmatter_and_avoids_collisions() {
    let root = temp_dir("create");
    let notebook = FsNotebook::new(&root);

    let first = notebook.create_note(&repo_a(), "todo", "My Note").unwrap();
    assert_eq!(first.title, "My Note");
    assert_eq!(first.note_type, "todo");
    assert_eq!(first.workspace, "repo-a");
    assert_eq!(first.group, "current");
    assert_eq!(
        first.path.parent(),
        Some(root.join("workspaces/repo-a/current").as_path())
    );
    let file_name = first.path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.ends_with("-my-note.md"), "{file_name}");

    let (fm, body) = frontmatter::parse(&fs::read_to_string(&first.path).unwrap());
    assert_eq!(fm.get("title"), Some("My Note"));
    assert_eq!(fm.get("type"), Some("todo"));
    assert_eq!(fm.get("workspace"), Some("repo-a"));
    assert_eq!(fm.get("group"), Some("current"));
    assert!(body.contains("# My Note"));

    let second = notebook.create_note(&repo_a(), "note", "My Note").unwrap();
    assert_ne!(first.path, second.path);

    fs::remove_dir_all(root).ok();
}

#[test]
fn create_rejects_bad_input() {
    let root = temp_dir("create-bad");
    let notebook = FsNotebook::new(&root);

    assert!(matches!(
        notebook.create_note(&repo_a(), "note", "   "),
        Err(NotebookError::EmptyTitle)
    ));
    let escaping = Placement::new(Some("repo-a".to_string()), "../outside");
    assert!(matches!(
        notebook.create_note(&escaping, "note", "Title"),
        Err(NotebookError::InvalidGroup(_))
    ));

    fs::remove_dir_all(root).ok();
}

#[test]
fn global_placement_lands_in_global_area() {
    let root = temp_dir("global");
    let notebook = FsNotebook::new(&root);

    let note = notebook
        .create_note(&Placement::new(None, "inbox"), "note", "Idea")
        .unwrap();
    assert_eq!(note.workspace, "global");
    assert!(note.path.starts_with(root.join("global/inbox")));

    let listed = notebook.list_global_items(false, false).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Idea");
    assert!(listed[0].is_global());

    fs::remove_dir_all(root).ok();
}

#[test]
fn listing_derives_groups_and_filters_archives() {
    let root = temp_dir("list");
    write_note(&root, "workspaces/repo-a/top.md", "Top", 1);
    write_note(&root, "workspaces/repo-a/plans/x/step.md", "Step", 2);
    write_note(&root, "workspaces/repo-a/current/.archive/old.md", "Old", 3);
    fs::write(root.join("workspaces/repo-a/plans/x/diagram.png"), b"png").unwrap();
    let notebook = FsNotebook::new(&root);
    let ws = workspace_node(&root, "repo-a");

    let mut groups: Vec<String> = notebook
        .list_all_items(&ws, false, false)
        .unwrap()
        .into_iter()
        .map(|note| note.group)
        .collect();
    groups.sort();
    assert_eq!(groups, vec!["current", "plans/x"]);

    let with_archives = notebook.list_all_items(&ws, true, false).unwrap();
    assert_eq!(with_archives.len(), 3);
    let old = with_archives.iter().find(|n| n.title == "Old").unwrap();
    assert!(old.is_archived);
    assert_eq!(old.group, "current/.archive");

    let with_artifacts = notebook.list_all_items(&ws, false, true).unwrap();
    assert!(with_artifacts.iter().any(|n| n.is_artifact));

    fs::remove_dir_all(root).ok();
}

#[test]
fn rename_keeps_date_prefix_and_updates_title() {
    let root = temp_dir("rename");
    let path = write_note(
        &root,
        "workspaces/repo-a/current/20240101-old-title.md",
        "Old title",
        1,
    );
    let notebook = FsNotebook::new(&root);

    let renamed = notebook.rename_note(&path, "Fresh Start").unwrap();
    assert_eq!(
        renamed.file_name().unwrap().to_string_lossy(),
        "20240101-fresh-start.md"
    );
    assert!(!path.exists());
    let note = notebook.load_note(&renamed).unwrap();
    assert_eq!(note.title, "Fresh Start");
    assert_eq!(note.workspace, "repo-a");
    assert_eq!(note.group, "current");

    assert!(matches!(
        notebook.rename_note(&renamed, ""),
        Err(NotebookError::EmptyTitle)
    ));

    fs::remove_dir_all(root).ok();
}

#[test]
fn delete_stops_at_first_failure() {
    let root = temp_dir("delete");
    let a = write_note(&root, "workspaces/repo-a/current/a.md", "A", 1);
    let missing = root.join("workspaces/repo-a/current/missing.md");
    let c = write_note(&root, "workspaces/repo-a/current/c.md", "C", 1);
    let notebook = FsNotebook::new(&root);

    let err = notebook
        .delete_notes(&[a.clone(), missing, c.clone()])
        .unwrap_err();
    assert_eq!(err.completed, vec![a.clone()]);
    assert!(!a.exists());
    assert!(c.exists());

    fs::remove_dir_all(root).ok();
}

#[test]
fn archive_moves_into_group_archive() {
    let root = temp_dir("archive-notes");
    let a = write_note(&root, "workspaces/repo-a/current/a.md", "A", 1);
    let notebook = FsNotebook::new(&root);

    let done = notebook.archive_notes(&[a.clone()]).unwrap();
    assert_eq!(done, vec![a.clone()]);
    assert!(!a.exists());
    let archived = root.join("workspaces/repo-a/current/.archive/a.md");
    assert!(archived.is_file());
    assert_eq!(
        notebook.load_note(&archived).unwrap().group,
        "current/.archive"
    );

    fs::remove_dir_all(root).ok();
}

#[test]
fn archiving_a_plan_twice_gets_a_suffix() {
    let root = temp_dir("archive-plan");
    write_note(&root, "workspaces/repo-a/plans/x/one.md", "One", 1);
    let notebook = FsNotebook::new(&root);

    let first = notebook.archive_plan(Some("repo-a"), "x").unwrap();
    assert_eq!(first, root.join("workspaces/repo-a/plans/.archive/x"));

    write_note(&root, "workspaces/repo-a/plans/x/two.md", "Two", 2);
    let second = notebook.archive_plan(Some("repo-a"), "x").unwrap();
    assert_ne!(second, first);
    let name = second.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("x-"), "{name}");
    assert!(second.join("two.md").is_file());
    assert!(first.join("one.md").is_file());

    assert!(matches!(
        notebook.archive_plan(Some("repo-a"), "x"),
        Err(NotebookError::NotFound(_))
    ));

    fs::remove_dir_all(root).ok();
}

#[test]
fn copy_rewrites_placement_and_keeps_source() {
    let root = temp_dir("copy-notes");
    let a = write_note(&root, "workspaces/repo-a/current/a.md", "A", 1);
    let notebook = FsNotebook::new(&root);

    let copies = notebook
        .copy_notes(&[a.clone()], &Placement::new(None, "inbox"))
        .unwrap();
    assert!(a.exists());
    let copy = notebook.load_note(&copies[0]).unwrap();
    assert_eq!(copy.workspace, "global");
    assert_eq!(copy.group, "inbox");
    let (fm, _) = frontmatter::parse(&fs::read_to_string(&copies[0]).unwrap());
    assert_eq!(fm.get("workspace"), Some("global"));

    fs::remove_dir_all(root).ok();
}

#[test]
fn registry_discovers_workspace_directories() {
    let root = temp_dir("discover");
    fs::create_dir_all(root.join("workspaces/zeta")).unwrap();
    fs::create_dir_all(root.join("workspaces/alpha")).unwrap();
    fs::create_dir_all(root.join("workspaces/.hidden")).unwrap();
    let registry = JsonWorkspaceRegistry::new(root.join("missing.json"), FsNotebook::new(&root));

    let names: Vec<String> = registry
        .all()
        .unwrap()
        .into_iter()
        .map(|ws| ws.name)
        .collect();
    assert_eq!(names, vec!["alpha", "zeta"]);

    fs::remove_dir_all(root).ok();
}

#[test]
fn registry_file_is_read_and_depths_filled() {
    let root = temp_dir("registry");
    let path = root.join("workspaces.json");
    fs::write(
        &path,
        r#"[
            {"name": "eco", "path": "/src/eco", "kind": "ecosystem_root"},
            {"name": "sub", "path": "/src/eco/sub", "kind": "ecosystem_sub_project",
             "parentEcosystemPath": "/src/eco"}
        ]"#,
    )
    .unwrap();
    let registry = JsonWorkspaceRegistry::new(&path, FsNotebook::new(&root));

    let nodes = registry.all().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].kind, WorkspaceKind::EcosystemSubProject);
    assert_eq!(nodes[1].depth, 1);

    fs::write(&path, "[{").unwrap();
    assert!(matches!(
        registry.all(),
        Err(NotebookError::Registry { .. })
    ));

    fs::remove_dir_all(root).ok();
}

#[test]
fn search_falls_back_without_ripgrep() {
    let root = temp_dir("search");
    let hit = write_note(&root, "workspaces/repo-a/current/hit.md", "Parser Notes", 1);
    write_note(&root, "workspaces/repo-a/current/miss.md", "Other", 2);
    let notebook = FsNotebook::new(&root);
    let dirs = notebook.note_dirs(&[workspace_node(&root, "repo-a")]);
    assert_eq!(dirs, vec![root.join("workspaces/repo-a")]);

    let search = RipgrepSearch::with_program("nb-test-no-such-rg");
    assert_eq!(search.grep("parser notes", &dirs).unwrap(), vec![hit]);
    assert!(search.grep("   ", &dirs).unwrap().is_empty());

    fs::remove_dir_all(root).ok();
}
