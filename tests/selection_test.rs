
use nb::browser::{
    execute, load_snapshot, BrowserConfig, ClipboardMode, Command, Message, Mutation,
    MutationOutcome, NodeKind, SelectionStore, Services,
};
use nb::core::frontmatter;
use nb::core::{FsNotebook, JsonWorkspaceRegistry, RipgrepSearch, TmuxMultiplexer};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use test_utils::{describe, loaded_browser, note, press, standalone, temp_dir, write_note};

fn services(root: &Path) -> Services {
    let notebook = FsNotebook::new(root);
    Services {
        workspaces: Arc::new(JsonWorkspaceRegistry::new(
            root.join("no-registry.json"),
            notebook.clone(),
        )),
        notes: Arc::new(notebook.clone()),
        service: Arc::new(notebook),
        search: Arc::new(RipgrepSearch::new()),
        multiplexer: Arc::new(TmuxMultiplexer::from_env()),
    }
}

fn config() -> BrowserConfig {
    BrowserConfig {
        hide_global: true,
        ..BrowserConfig::default()
    }
}

#[test]
fn selection_toggles_and_purges() {
    let alpha = note("repo-a", "current", "Alpha", 1);
    let beta = note("repo-a", "current", "Beta", 2);
    let mut store = SelectionStore::new();

    store.toggle_note(&alpha.path);
    store.toggle_note(&beta.path);
    store.toggle_note(&alpha.path);
    assert!(!store.is_selected(&alpha.path));
    assert!(store.is_selected(&beta.path));

    store.select_notes(vec![alpha.path.clone()]);
    assert_eq!(store.len(), 2);

    store.purge(&[alpha.clone()]);
    assert_eq!(store.notes(), vec![alpha.path.clone()]);

    store.set_clipboard(vec![alpha.path.clone()], ClipboardMode::Cut);
    assert!(store.is_cut(&alpha.path));
    store.purge(&[]);
    assert!(store.clipboard().is_none());
}

#[test]
fn archived_selection_leaves_the_tree() {
    let notes = vec![
        note("repo-a", "current", "Alpha", 1),
        note("repo-a", "current", "Beta", 2),
        note("repo-a", "current", "Gamma", 3),
    ];
    let mut browser = loaded_browser(config(), vec![standalone("repo-a")], notes.clone());

    // Rows: repo-a, current, Gamma, Beta, Alpha.
    press(&mut browser, "j j j space j space");
    assert_eq!(browser.selection().len(), 2);

    let commands = press(&mut browser, "X");
    assert!(commands.is_empty());
    let archive = match press(&mut browser, "y").pop() {
        Some(command @ Command::Archive { .. }) => command,
        other => panic!("unexpected command: {other:?}"),
    };
    let Command::Archive { notes: targets, .. } = &archive else {
        unreachable!();
    };
    assert_eq!(targets.len(), 2);

    let commands = browser.on_message(Message::Mutated {
        mutation: Mutation::Archive,
        outcome: MutationOutcome::ok(targets.clone()),
    });
    assert!(matches!(commands.as_slice(), [Command::LoadData { .. }]));
    assert!(browser.selection().is_empty());
    assert_eq!(browser.notes().len(), 1);
    let remaining: Vec<String> = browser
        .nodes()
        .iter()
        .filter(|node| matches!(node.kind, NodeKind::Note(_)))
        .map(describe)
        .collect();
    assert_eq!(remaining, vec!["note:Gamma"]);
    assert_eq!(
        browser.status().map(|s| s.text.as_str()),
        Some("Archived 2 notes")
    );
}

#[test]
fn partial_failure_reports_progress() {
    let notes = vec![
        note("repo-a", "current", "Alpha", 1),
        note("repo-a", "current", "Beta", 2),
    ];
    let mut browser = loaded_browser(config(), vec![standalone("repo-a")], notes.clone());

    browser.on_message(Message::Mutated {
        mutation: Mutation::Delete,
        outcome: MutationOutcome::failed(vec![notes[0].path.clone()], "disk full"),
    });

    assert_eq!(browser.notes().len(), 1);
    let status = browser.status().unwrap();
    assert!(status.is_error);
    assert_eq!(status.text, "Deleted 1 note before failing: disk full");
}

#[test]
fn cut_and_paste_moves_notes_between_workspaces() {
    let root = temp_dir("cut-paste");
    let alpha = write_note(&root, "workspaces/repo-a/current/alpha.md", "Alpha", 1);
    let beta = write_note(&root, "workspaces/repo-a/current/beta.md", "Beta", 2);
    write_note(&root, "workspaces/repo-b/current/charlie.md", "Charlie", 3);
    let services = services(&root);

    let (workspaces, notes, errors) = load_snapshot(&services, None, false);
    assert!(errors.is_empty(), "{errors:?}");
    let mut browser = loaded_browser(config(), workspaces, notes);

    // Rows: repo-a, current, Beta, Alpha, repo-b, current, Charlie.
    press(&mut browser, "j j space j space x");
    let clipboard = browser.selection().clipboard().cloned().unwrap();
    assert_eq!(clipboard.mode, ClipboardMode::Cut);
    assert_eq!(clipboard.paths.len(), 2);
    assert!(browser.selection().is_empty());

    let paste = match press(&mut browser, "G p").as_slice() {
        [command @ Command::Paste { dest, .. }] => {
            assert_eq!(dest.workspace.as_deref(), Some("repo-b"));
            assert_eq!(dest.group, "current");
            command.clone()
        }
        other => panic!("unexpected commands: {other:?}"),
    };
    assert_eq!(browser.selection().clipboard(), Some(&clipboard));

    let message = execute(&services, paste).unwrap();
    let moved = match &message {
        Message::Mutated {
            mutation: Mutation::Paste(ClipboardMode::Cut),
            outcome,
        } => {
            assert_eq!(outcome.error, None);
            outcome.completed.clone()
        }
        other => panic!("unexpected message: {other:?}"),
    };
    assert_eq!(moved.len(), 2);
    assert!(!alpha.exists());
    assert!(!beta.exists());

    let dest_dir = root.join("workspaces/repo-b/current");
    for path in &moved {
        assert_eq!(path.parent(), Some(dest_dir.as_path()));
        let (fm, body) = frontmatter::parse(&fs::read_to_string(path).unwrap());
        assert_eq!(fm.get("workspace"), Some("repo-b"));
        assert_eq!(fm.get("group"), Some("current"));
        assert!(fm.get("modified").is_some());
        assert!(body.contains("# "));
    }

    // The follow-up reload lands the cursor on the first pasted note.
    let reload = browser.on_message(message).remove(0);
    assert!(browser.selection().clipboard().is_none());
    let loaded = execute(&services, reload).unwrap();
    browser.on_message(loaded);
    let cursor_note = browser.current().and_then(|node| node.note()).unwrap();
    assert_eq!(cursor_note.path, moved[0]);
    assert_eq!(cursor_note.workspace, "repo-b");

    fs::remove_dir_all(root).ok();
}

#[test]
fn failed_cut_paste_keeps_unmoved_notes_on_the_clipboard() {
    let notes = vec![
        note("repo-a", "current", "Alpha", 1),
        note("repo-a", "current", "Beta", 2),
        note("repo-b", "current", "Charlie", 3),
    ];
    let workspaces = vec![standalone("repo-a"), standalone("repo-b")];
    let mut browser = loaded_browser(config(), workspaces, notes.clone());

    // Rows: repo-a, current, Beta, Alpha, repo-b, current, Charlie.
    press(&mut browser, "j j space j space x G p");
    let cut = browser.selection().clipboard().cloned().unwrap();
    assert_eq!(cut.paths.len(), 2);

    browser.on_message(Message::Mutated {
        mutation: Mutation::Paste(ClipboardMode::Cut),
        outcome: MutationOutcome::failed(Vec::new(), "disk full"),
    });
    assert_eq!(browser.selection().clipboard(), Some(&cut));
    assert_eq!(browser.status().unwrap().text, "disk full");

    let moved = PathBuf::from("/nb/repo-b/current/moved.md");
    browser.on_message(Message::Mutated {
        mutation: Mutation::Paste(ClipboardMode::Cut),
        outcome: MutationOutcome::failed(vec![moved], "disk full"),
    });
    let left = browser.selection().clipboard().cloned().unwrap();
    assert_eq!(left.mode, ClipboardMode::Cut);
    assert_eq!(left.paths, cut.paths[1..].to_vec());
}

#[test]
fn snapshot_lists_each_workspace_name_once() {
    let root = temp_dir("snapshot-dupes");
    write_note(&root, "workspaces/api/current/a.md", "A", 1);
    fs::write(
        root.join("no-registry.json"),
        r#"[
            {"name": "eco1", "path": "/src/eco1", "kind": "ecosystem_root"},
            {"name": "api", "path": "/src/eco1/api", "kind": "ecosystem_sub_project",
             "parentEcosystemPath": "/src/eco1"},
            {"name": "eco2", "path": "/src/eco2", "kind": "ecosystem_root"},
            {"name": "api", "path": "/src/eco2/api", "kind": "ecosystem_sub_project",
             "parentEcosystemPath": "/src/eco2"}
        ]"#,
    )
    .unwrap();

    let (workspaces, notes, errors) = load_snapshot(&services(&root), None, false);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(workspaces.len(), 4);
    assert_eq!(notes.len(), 1);

    fs::remove_dir_all(root).ok();
}

#[test]
fn copy_keeps_the_clipboard() {
    let root = temp_dir("copy");
    let alpha = write_note(&root, "workspaces/repo-a/current/alpha.md", "Alpha", 1);
    let services = services(&root);
    let (workspaces, notes, _) = load_snapshot(&services, None, false);
    let mut browser = loaded_browser(config(), workspaces, notes);

    // Rows: repo-a, current, Alpha.
    press(&mut browser, "G y");
    let commands = press(&mut browser, "g g p");
    assert!(browser.selection().clipboard().is_some());

    let copied: Vec<PathBuf> = match execute(&services, commands[0].clone()) {
        Some(Message::Mutated { outcome, .. }) => outcome.completed,
        other => panic!("unexpected message: {other:?}"),
    };
    assert!(alpha.exists());
    assert_eq!(copied.len(), 1);
    assert_ne!(copied[0], alpha);
    assert!(copied[0].exists());

    fs::remove_dir_all(root).ok();
}

#[test]
fn archive_command_moves_files_and_plans() {
    let root = temp_dir("archive");
    let alpha = write_note(&root, "workspaces/repo-a/current/alpha.md", "Alpha", 1);
    write_note(&root, "workspaces/repo-a/plans/x/step.md", "Step", 2);
    let services = services(&root);
    let (workspaces, notes, _) = load_snapshot(&services, None, false);
    let mut browser = loaded_browser(config(), workspaces, notes);

    // Rows: repo-a, current, Alpha, plans, plans/x, Step.
    press(&mut browser, "j j space j j space X");
    let command = match press(&mut browser, "y").pop() {
        Some(command @ Command::Archive { .. }) => command,
        other => panic!("unexpected command: {other:?}"),
    };
    let Some(Message::Mutated { outcome, .. }) = execute(&services, command) else {
        panic!("archive produced no outcome");
    };

    assert_eq!(outcome.error, None);
    assert!(!alpha.exists());
    assert!(root
        .join("workspaces/repo-a/current/.archive/alpha.md")
        .is_file());
    assert!(root
        .join("workspaces/repo-a/plans/.archive/x/step.md")
        .is_file());
    assert!(!root.join("workspaces/repo-a/plans/x").exists());

    fs::remove_dir_all(root).ok();
}
