
use nb::browser::{
    Browser, BrowserConfig, Command, CreatePlacement, Message, Mode, Mutation, MutationOutcome,
};
use nb::core::launch::HandoffKind;
use nb::core::model::Note;
use nb::core::sources::Placement;
use std::path::PathBuf;
use test_utils::{describe, describe_all, loaded_browser, note, press, standalone};

fn repo_notes() -> Vec<Note> {
    vec![
        note("repo-a", "current", "Alpha", 1),
        note("repo-a", "current", "Beta", 2),
        note("repo-a", "plans/x", "Charlie", 3),
        note("repo-a", "current/.archive", "Old", 1),
    ]
}

fn config() -> BrowserConfig {
    BrowserConfig {
        hide_global: true,
        ..BrowserConfig::default()
    }
}

/// Rows: repo-a, current, Beta, Alpha, plans, plans/x, Charlie.
fn browser() -> Browser {
    loaded_browser(config(), vec![standalone("repo-a")], repo_notes())
}

fn path(group: &str, slug: &str) -> PathBuf {
    PathBuf::from(format!("/nb/repo-a/{group}/{slug}.md"))
}

fn current(browser: &Browser) -> String {
    browser.current().map(describe).unwrap_or_default()
}

#[test]
fn gg_returns_to_top_from_anywhere() {
    let mut browser = browser();
    for start in ["", "j", "j j j", "G"] {
        press(&mut browser, start);
        press(&mut browser, "g g");
        assert_eq!(browser.cursor(), 0);
    }
}

#[test]
fn broken_sequence_handles_second_key_fresh() {
    let mut browser = browser();
    assert!(press(&mut browser, "g").is_empty());
    assert_eq!(browser.pending_keys(), Some("g"));

    press(&mut browser, "j");
    assert_eq!(browser.cursor(), 1);
    assert_eq!(browser.pending_keys(), None);
}

#[test]
fn cursor_is_clamped() {
    let mut browser = browser();
    press(&mut browser, "k k");
    assert_eq!(browser.cursor(), 0);

    press(&mut browser, "G j j");
    assert_eq!(browser.cursor(), browser.nodes().len() - 1);
    assert_eq!(current(&browser), "note:Charlie");
}

#[test]
fn empty_tree_keeps_cursor_at_zero() {
    let mut browser = loaded_browser(config(), Vec::new(), Vec::new());
    assert!(browser.nodes().is_empty());

    press(&mut browser, "j G k g g ctrl+d");
    assert_eq!(browser.cursor(), 0);
    assert!(browser.current().is_none());
    assert!(press(&mut browser, "enter X d d r").is_empty());
    assert_eq!(browser.mode(), &Mode::Browsing);
}

#[test]
fn digits_jump_to_workspaces() {
    let mut browser = browser();
    press(&mut browser, "G 1");
    assert_eq!(browser.cursor(), 0);

    // No second workspace, so 2 does nothing.
    press(&mut browser, "j 2");
    assert_eq!(browser.cursor(), 1);
}

#[test]
fn live_filter_narrows_and_escape_restores() {
    let mut browser = browser();
    press(&mut browser, "/ b e");
    assert_eq!(
        browser.mode(),
        &Mode::Filtering {
            query: "be".to_string(),
            is_grep: false,
        }
    );
    assert_eq!(
        describe_all(browser.nodes()),
        vec!["ws:repo-a", "group:current", "note:Beta"]
    );

    press(&mut browser, "esc");
    assert_eq!(browser.mode(), &Mode::Browsing);
    assert!(browser.filter().is_none());
    assert_eq!(browser.nodes().len(), 7);
}

#[test]
fn filter_survives_enter() {
    let mut browser = browser();
    press(&mut browser, "/ c h a enter");

    assert_eq!(browser.mode(), &Mode::Browsing);
    assert_eq!(browser.filter().map(|f| f.query()), Some("cha"));
    assert_eq!(
        describe_all(browser.nodes()),
        vec!["ws:repo-a", "group:plans", "group:plans/x", "note:Charlie"]
    );
}

#[test]
fn grep_applies_only_matching_results() {
    let mut browser = browser();
    let commands = press(&mut browser, "* f o o enter");
    assert!(matches!(
        commands.as_slice(),
        [Command::Grep { query, .. }] if query == "foo"
    ));

    browser.on_message(Message::GrepResults {
        query: "other".to_string(),
        result: Ok(vec![path("current", "beta")]),
    });
    assert!(browser.filter().is_none());

    browser.on_message(Message::GrepResults {
        query: "foo".to_string(),
        result: Ok(vec![path("current", "alpha")]),
    });
    assert!(browser.filter().is_some_and(|f| f.is_grep()));
    assert_eq!(
        describe_all(browser.nodes()),
        vec!["ws:repo-a", "group:current", "note:Alpha"]
    );
    assert_eq!(
        browser.status().map(|s| s.text.as_str()),
        Some("1 match for \"foo\"")
    );
}

#[test]
fn reopening_grep_discards_pending_search() {
    let mut browser = browser();
    press(&mut browser, "* f o o enter / esc");

    browser.on_message(Message::GrepResults {
        query: "foo".to_string(),
        result: Ok(vec![path("current", "alpha")]),
    });
    assert!(browser.filter().is_none());
}

#[test]
fn stale_data_is_ignored() {
    let mut browser = browser();
    let stale = browser.generation();
    let commands = press(&mut browser, "ctrl+r");
    assert!(matches!(
        commands.as_slice(),
        [Command::LoadData { generation, .. }] if *generation == stale + 1
    ));
    assert!(browser.is_loading());

    browser.on_message(Message::DataLoaded {
        generation: stale,
        workspaces: Vec::new(),
        notes: Vec::new(),
        errors: Vec::new(),
    });
    assert_eq!(browser.nodes().len(), 7);
    assert!(browser.is_loading());

    browser.on_message(Message::DataLoaded {
        generation: stale + 1,
        workspaces: vec![standalone("repo-a")],
        notes: vec![note("repo-a", "current", "Alpha", 1)],
        errors: Vec::new(),
    });
    assert!(!browser.is_loading());
    assert_eq!(browser.nodes().len(), 3);
}

#[test]
fn cursor_follows_its_row_across_reloads() {
    let mut browser = browser();
    press(&mut browser, "j j j");
    assert_eq!(current(&browser), "note:Alpha");

    let generation = match press(&mut browser, "ctrl+r").as_slice() {
        [Command::LoadData { generation, .. }] => *generation,
        other => panic!("unexpected commands: {other:?}"),
    };
    let mut notes = repo_notes();
    notes.push(note("repo-a", "current", "Newest", 9));
    browser.on_message(Message::DataLoaded {
        generation,
        workspaces: vec![standalone("repo-a")],
        notes,
        errors: Vec::new(),
    });

    assert_eq!(current(&browser), "note:Alpha");
    assert_eq!(browser.cursor(), 4);
}

#[test]
fn enter_opens_notes_and_folds_groups() {
    let mut browser = browser();
    press(&mut browser, "j");
    assert!(press(&mut browser, "enter").is_empty());
    assert_eq!(browser.nodes().len(), 5);

    press(&mut browser, "j j j");
    assert_eq!(
        press(&mut browser, "enter"),
        vec![Command::OpenEditor {
            path: path("plans/x", "charlie"),
        }]
    );
}

#[test]
fn embedded_handoff_quits_after_open() {
    let config = BrowserConfig {
        handoff: true,
        embedded: true,
        ..config()
    };
    let mut browser = loaded_browser(config, vec![standalone("repo-a")], repo_notes());
    press(&mut browser, "j j");

    assert_eq!(
        press(&mut browser, "enter"),
        vec![
            Command::Handoff {
                path: path("current", "beta"),
                kind: HandoffKind::Open,
            },
            Command::Quit,
        ]
    );
    assert_eq!(
        press(&mut browser, "v"),
        vec![Command::Handoff {
            path: path("current", "beta"),
            kind: HandoffKind::Preview,
        }]
    );
}

#[test]
fn preview_without_handoff_only_reports() {
    let mut browser = browser();
    press(&mut browser, "j j");
    assert!(press(&mut browser, "v").is_empty());
    assert!(browser.status().is_some());
}

#[test]
fn fold_keys() {
    let mut browser = browser();
    press(&mut browser, "j j z M");
    assert_eq!(describe_all(browser.nodes()), vec!["ws:repo-a"]);
    assert_eq!(browser.cursor(), 0);

    press(&mut browser, "z R");
    assert_eq!(browser.nodes().len(), 7);

    press(&mut browser, "j j z c");
    assert_eq!(current(&browser), "group:current");
    assert_eq!(browser.nodes().len(), 5);

    press(&mut browser, "l");
    assert_eq!(browser.nodes().len(), 7);
    press(&mut browser, "l");
    assert_eq!(current(&browser), "note:Beta");
    press(&mut browser, "h");
    assert_eq!(current(&browser), "group:current");
}

#[test]
fn confirmations() {
    let mut browser = browser();
    press(&mut browser, "j j X");
    assert!(matches!(browser.mode(), Mode::ConfirmingArchive { notes, .. } if notes.len() == 1));

    press(&mut browser, "w");
    assert!(matches!(browser.mode(), Mode::ConfirmingArchive { .. }));

    assert!(press(&mut browser, "n").is_empty());
    assert_eq!(browser.mode(), &Mode::Browsing);

    press(&mut browser, "d d");
    assert_eq!(
        browser.mode(),
        &Mode::ConfirmingDelete {
            notes: vec![path("current", "beta")],
        }
    );
    assert_eq!(
        press(&mut browser, "y"),
        vec![Command::Delete {
            notes: vec![path("current", "beta")],
        }]
    );
    assert_eq!(browser.mode(), &Mode::Browsing);
}

#[test]
fn archiving_a_plan_group_targets_the_plan() {
    let mut browser = browser();
    press(&mut browser, "G k X");

    match browser.mode() {
        Mode::ConfirmingArchive { notes, plans } => {
            assert!(notes.is_empty());
            assert_eq!(plans.len(), 1);
            assert_eq!(plans[0].key.group, "plans/x");
            assert_eq!(plans[0].notes, vec![path("plans/x", "charlie")]);
        }
        other => panic!("unexpected mode: {other:?}"),
    }
}

#[test]
fn create_flow() {
    let mut browser = browser();
    press(&mut browser, "j j n j enter H i");
    match browser.mode() {
        Mode::CreatingNote {
            target,
            type_index,
            title,
            ..
        } => {
            assert_eq!(target, &Placement::new(Some("repo-a".to_string()), "current"));
            assert_eq!(*type_index, 1);
            assert_eq!(title, "Hi");
        }
        other => panic!("unexpected mode: {other:?}"),
    }

    assert_eq!(
        press(&mut browser, "enter"),
        vec![Command::Create {
            placement: Placement::new(Some("repo-a".to_string()), "current"),
            note_type: "todo".to_string(),
            title: "Hi".to_string(),
        }]
    );

    let created = path("current", "hi");
    let commands = browser.on_message(Message::Mutated {
        mutation: Mutation::Create,
        outcome: MutationOutcome::ok(vec![created.clone()]),
    });
    assert!(matches!(commands[0], Command::LoadData { .. }));
    assert_eq!(commands[1], Command::OpenEditor { path: created });
}

#[test]
fn empty_title_is_rejected() {
    let mut browser = browser();
    // Group rows are not renameable.
    press(&mut browser, "j r");
    assert_eq!(browser.mode(), &Mode::Browsing);

    press(&mut browser, "j r backspace backspace backspace backspace enter");
    assert!(matches!(browser.mode(), Mode::RenamingNote { .. }));
    assert!(browser.status().is_some_and(|s| s.is_error));

    assert_eq!(
        press(&mut browser, "G a m m a enter"),
        vec![Command::Rename {
            path: path("current", "beta"),
            title: "Gamma".to_string(),
        }]
    );
}

#[test]
fn create_targets() {
    let mut browser = loaded_browser(
        BrowserConfig {
            show_archives: true,
            ..BrowserConfig::default()
        },
        vec![standalone("repo-a")],
        {
            let mut notes = repo_notes();
            notes.push(note("global", "inbox", "Idea", 1));
            notes
        },
    );
    // global, inbox, Idea, Ungrouped, repo-a, current, Beta, Alpha, .archive, Old, ...
    assert_eq!(current(&browser), "ws:global");
    assert_eq!(
        browser.create_target(CreatePlacement::Context),
        Placement::new(None, "current")
    );

    press(&mut browser, "2");
    assert_eq!(current(&browser), "ws:repo-a");
    assert_eq!(
        browser.create_target(CreatePlacement::Inbox),
        Placement::new(Some("repo-a".to_string()), "inbox")
    );
    assert_eq!(
        browser.create_target(CreatePlacement::Global),
        Placement::new(None, "inbox")
    );

    press(&mut browser, "j j j j");
    assert_eq!(current(&browser), "group:current/.archive");
    assert_eq!(
        browser.create_target(CreatePlacement::Context),
        Placement::new(Some("repo-a".to_string()), "current")
    );
}

#[test]
fn paste_destinations() {
    let mut browser = browser();
    assert_eq!(
        browser.paste_destination(),
        Some(Placement::new(Some("repo-a".to_string()), "current"))
    );

    press(&mut browser, "G k");
    assert_eq!(
        browser.paste_destination(),
        Some(Placement::new(Some("repo-a".to_string()), "plans/x"))
    );

    press(&mut browser, "j");
    assert_eq!(
        browser.paste_destination(),
        Some(Placement::new(Some("repo-a".to_string()), "plans/x"))
    );
}

#[test]
fn picker_and_focus() {
    let mut browser = browser();
    press(&mut browser, "e");
    assert_eq!(browser.mode(), &Mode::EcosystemPicker);
    assert!(browser.nodes().is_empty());
    assert!(browser.status().is_some());

    press(&mut browser, "esc");
    assert_eq!(browser.mode(), &Mode::Browsing);

    let commands = press(&mut browser, "j f");
    assert!(matches!(
        commands.as_slice(),
        [Command::LoadData { focus: Some(ws), .. }] if ws.name == "repo-a"
    ));
    assert_eq!(
        browser.options().focus.as_ref().map(|ws| ws.name.as_str()),
        Some("repo-a")
    );

    assert!(matches!(
        press(&mut browser, "-").as_slice(),
        [Command::LoadData { focus: None, .. }]
    ));
}

#[test]
fn help_closes_on_any_key() {
    let mut browser = browser();
    press(&mut browser, "?");
    assert_eq!(browser.mode(), &Mode::HelpOverlay);
    assert!(press(&mut browser, "j").is_empty());
    assert_eq!(browser.mode(), &Mode::Browsing);
    assert_eq!(browser.cursor(), 0);
}

#[test]
fn column_picker_toggles_and_saves() {
    let mut browser = browser();
    let before = browser.columns().visible_columns();
    let commands = press(&mut browser, "C space");

    assert!(matches!(commands.as_slice(), [Command::SaveColumns { .. }]));
    assert_ne!(browser.columns().visible_columns(), before);
    assert!(matches!(browser.mode(), Mode::ColumnPicker { index: 0 }));

    press(&mut browser, "esc");
    assert_eq!(browser.mode(), &Mode::Browsing);
}

#[test]
fn ctrl_c_quits_from_any_mode() {
    let mut browser = browser();
    press(&mut browser, "/ a");
    assert_eq!(press(&mut browser, "ctrl+c"), vec![Command::Quit]);
    // q is text while filtering.
    assert!(press(&mut browser, "q").is_empty());
    assert_eq!(press(&mut browser, "esc q"), vec![Command::Quit]);
}

#[test]
fn unknown_focus_reports_an_error() {
    let config = BrowserConfig {
        focus: Some("nope".to_string()),
        ..config()
    };
    let browser = loaded_browser(config, vec![standalone("repo-a")], repo_notes());

    assert!(browser.options().focus.is_none());
    assert!(browser.status().is_some_and(|s| s.is_error));
}

#[test]
fn focus_resolves_by_name_or_path() {
    for wanted in ["repo-a", "/src/repo-a"] {
        let config = BrowserConfig {
            focus: Some(wanted.to_string()),
            ..config()
        };
        let browser = loaded_browser(config, vec![standalone("repo-a")], repo_notes());
        assert_eq!(
            browser.options().focus.as_ref().map(|ws| ws.name.as_str()),
            Some("repo-a")
        );
    }
}
