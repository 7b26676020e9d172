// 検索セッション全体の統合テスト
// 実ファイルのツリーを構築し、スクリプト化したキー入力で走査を操作する

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use ts::display::RecordingSurface;
use ts::tui::{Controller, KeyProfile, Launcher, ScriptedKeys};
use ts::{
    run, BinaryKind, ItemTree, Listing, QueryLanguage, SearchMode, Session, SessionConfig,
    SessionReport, Strategy, TellSource, TsResult,
};

/// 外部プログラムを起動しないランチャー
struct NoopLauncher;

impl Launcher for NoopLauncher {
    fn open_editor(&self, _path: &Path, _line: usize) -> TsResult<()> {
        Ok(())
    }

    fn open_folder(&self, _path: &Path) -> TsResult<()> {
        Ok(())
    }

    fn copy_text(&self, _text: &str) -> TsResult<()> {
        Ok(())
    }
}

fn run_session(
    roots: &[PathBuf],
    config: &SessionConfig,
    keys: &str,
) -> anyhow::Result<(SessionReport, RecordingSurface)> {
    let mut tree = ItemTree::build(roots, config);
    let mut strategy = Strategy::from_config(config)?;
    let mut surface = RecordingSurface::new(80);
    let report = {
        let controller = Controller::new(ScriptedKeys::from_chars(keys), NoopLauncher);
        let mut session = Session::new(config, &mut surface, controller);
        run(&mut tree, &mut strategy, &mut session)?
    };
    Ok((report, surface))
}

fn auto(mode: SearchMode, query: &str) -> SessionConfig {
    let mut config = SessionConfig::new(mode, query);
    config.auto = true;
    config.recurse = true;
    config
}

mod literal_sessions {
    use super::*;

    #[test]
    fn should_find_each_occurrence_once() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("pets.txt"), "the cat sat\ncats\n")?;

        let config = auto(SearchMode::Literal, "CAT");
        let (report, surface) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;

        assert_eq!(report.hits, 2);
        assert_eq!(report.files, 1);
        assert_eq!(report.documents_with_hits, 1);
        assert!(surface.contains_line("#1   Line:     1 Col:    5 ->"));
        assert!(surface.contains_line("#2   Line:     2 Col:    1 ->"));
        assert!(surface.contains_line("Found 2 times in 1 files"));
        assert_eq!(surface.blocks().len(), 2);
        Ok(())
    }

    #[test]
    fn should_find_overlapping_occurrences() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.txt"), "aaaa\n")?;

        let config = auto(SearchMode::Literal, "aa");
        let (report, _) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;
        assert_eq!(report.hits, 3);
        Ok(())
    }

    #[test]
    fn should_stop_at_hit_limit() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(temp_dir.path().join(name), "needle\nneedle\n")?;
        }

        let mut config = auto(SearchMode::Literal, "needle");
        config.hit_limit = Some(3);
        let (report, _) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;

        assert_eq!(report.hits, 3);
        assert_eq!(report.files, 2);
        assert!(!report.canceled);
        Ok(())
    }

    #[test]
    fn should_show_only_focus_line_with_single_line_window() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.txt"), "before\nthe needle here\nafter\n")?;

        let mut config = auto(SearchMode::Literal, "needle");
        config.line_count = 1;
        let (_, surface) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;

        let blocks = surface.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].1, vec!["the needle here".to_string()]);
        Ok(())
    }
}

mod interactive_sessions {
    use super::*;

    fn interactive(query: &str) -> SessionConfig {
        let mut config = SessionConfig::new(SearchMode::Literal, query);
        config.recurse = true;
        config
    }

    #[test]
    fn should_quit_with_report() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.txt"), "needle\nneedle\n")?;
        fs::write(temp_dir.path().join("b.txt"), "needle\n")?;

        let (report, surface) =
            run_session(&[temp_dir.path().to_path_buf()], &interactive("needle"), "n")?;

        assert!(report.canceled);
        assert_eq!(report.hits, 1);
        let lines = surface.lines();
        let tail: Vec<&str> = lines.iter().rev().take(3).map(String::as_str).collect();
        assert_eq!(
            tail,
            vec!["Scanned 1 files", "Found 1 times in 1 files", "canceled"]
        );
        Ok(())
    }

    #[test]
    fn should_skip_rest_of_document() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.txt"), "needle\nneedle\nneedle\n")?;
        fs::write(temp_dir.path().join("b.txt"), "needle\n")?;

        let (report, _) =
            run_session(&[temp_dir.path().to_path_buf()], &interactive("needle"), "s")?;

        assert_eq!(report.hits, 2);
        assert_eq!(report.files, 2);
        assert_eq!(report.documents_with_hits, 2);
        Ok(())
    }

    #[test]
    fn should_skip_rest_of_folder() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let one = temp_dir.path().join("one");
        let two = temp_dir.path().join("two");
        fs::create_dir_all(&one)?;
        fs::create_dir_all(&two)?;
        fs::write(one.join("a.txt"), "needle\n")?;
        fs::write(one.join("b.txt"), "needle\n")?;
        fs::write(two.join("c.txt"), "needle\n")?;

        let (report, surface) =
            run_session(&[temp_dir.path().to_path_buf()], &interactive("needle"), "f")?;

        assert_eq!(report.hits, 2);
        assert_eq!(report.files, 2);
        assert!(!surface.contains_line("b.txt"));
        assert!(surface.contains_line("c.txt"));
        Ok(())
    }

    #[test]
    fn should_stop_prompting_after_auto_key() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.txt"), "needle\nneedle\nneedle\n")?;

        // "a" then "n": the quit key is never read
        let (report, _) =
            run_session(&[temp_dir.path().to_path_buf()], &interactive("needle"), "an")?;

        assert!(!report.canceled);
        assert_eq!(report.hits, 3);
        Ok(())
    }

    #[test]
    fn should_ignore_unknown_keys() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.txt"), "needle\n")?;

        let (report, surface) =
            run_session(&[temp_dir.path().to_path_buf()], &interactive("needle"), "zzn")?;

        assert!(report.canceled);
        assert_eq!(surface.blocks().len(), 1);
        Ok(())
    }

    #[test]
    fn should_redraw_same_hit_when_scrolling() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let text: String = (0..20).map(|i| format!("line {i}\n")).collect();
        fs::write(temp_dir.path().join("a.txt"), text.replace("line 10\n", "needle\n"))?;

        let config = interactive("needle");
        let mut tree = ItemTree::build(&[temp_dir.path().to_path_buf()], &config);
        let mut strategy = Strategy::from_config(&config)?;
        let mut surface = RecordingSurface::new(80);
        let keys = ScriptedKeys::new(vec![
            KeyEvent::new(KeyCode::Down, KeyModifiers::NONE),
            KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE),
        ]);
        let report = {
            let mut session =
                Session::new(&config, &mut surface, Controller::new(keys, NoopLauncher));
            run(&mut tree, &mut strategy, &mut session)?
        };

        assert_eq!(report.hits, 1);
        let blocks = surface.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].0, blocks[1].0);
        assert_eq!(blocks[0].1[2], "needle");
        assert_eq!(blocks[1].1[1], "needle");
        Ok(())
    }
}

mod batch_sessions {
    use super::*;

    #[test]
    fn should_list_files_without_occurrences() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.txt"), "needle\n")?;
        fs::write(temp_dir.path().join("b.txt"), "hay\n")?;
        fs::write(temp_dir.path().join("c.txt"), "more hay\n")?;

        let config = SessionConfig::new(
            SearchMode::Tell {
                listing: Listing::Not,
                source: TellSource::Literal,
            },
            "needle",
        );
        let (report, surface) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;

        let listed: Vec<String> = surface
            .lines()
            .into_iter()
            .filter(|line| line.starts_with("  "))
            .collect();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].ends_with("b.txt"));
        assert!(listed[1].ends_with("c.txt"));
        assert_eq!(report.hits, 1);
        assert_eq!(report.files, 3);
        Ok(())
    }

    #[test]
    fn should_sort_counts_descending() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.txt"), "todo\n")?;
        fs::write(temp_dir.path().join("b.txt"), "todo todo todo\n")?;
        fs::write(temp_dir.path().join("c.txt"), "nothing\n")?;

        let config = SessionConfig::new(
            SearchMode::Tell {
                listing: Listing::Count,
                source: TellSource::Pattern("to+do".to_string()),
            },
            "",
        );
        let (report, surface) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;

        let counts: Vec<String> = surface
            .lines()
            .into_iter()
            .filter(|line| line.contains(" -> "))
            .collect();
        assert_eq!(counts.len(), 2);
        assert!(counts[0].starts_with("       3 -> ") && counts[0].ends_with("b.txt"));
        assert!(counts[1].starts_with("       1 -> ") && counts[1].ends_with("a.txt"));
        assert_eq!(report.hits, 4);
        Ok(())
    }

    #[test]
    fn should_print_unique_matches_once() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("a.c"), "maxSize = sizeOf(x);\n")?;
        fs::write(temp_dir.path().join("b.c"), "maxSize++;\nSIZEOF\n")?;

        let config = SessionConfig::new(
            SearchMode::Match {
                pattern: None,
                unique: true,
                show_file: false,
            },
            "size",
        );
        let (report, surface) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;

        let words: Vec<String> = surface
            .lines()
            .into_iter()
            .filter(|line| line.to_lowercase().contains("size") && !line.contains(' '))
            .collect();
        assert_eq!(words, vec!["maxSize", "sizeOf", "SIZEOF"]);
        assert_eq!(report.hits, 3);
        Ok(())
    }

    #[test]
    fn should_count_structured_matches_and_skip_bad_documents() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(
            temp_dir.path().join("a.json"),
            "{\n  \"servers\": [\n    {\"port\": 80},\n    {\"port\": 81}\n  ]\n}\n",
        )?;
        fs::write(temp_dir.path().join("b.json"), "{ not json")?;

        let mut config = SessionConfig::new(
            SearchMode::Tell {
                listing: Listing::Count,
                source: TellSource::Structured,
            },
            "servers/*/port",
        );
        config.query_language = QueryLanguage::JsonPath;
        let (report, surface) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;

        assert_eq!(report.hits, 2);
        assert_eq!(report.files, 1);
        assert!(surface.contains_line("       2 -> "));
        Ok(())
    }

    #[test]
    fn should_count_xpath_matches_in_xml_documents() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(
            temp_dir.path().join("a.xml"),
            "<servers>\n  <server port=\"80\"/>\n  <server port=\"81\"/>\n</servers>\n",
        )?;
        fs::write(temp_dir.path().join("b.json"), "{\"server\": 1}")?;

        let config = SessionConfig::new(
            SearchMode::Tell {
                listing: Listing::Names,
                source: TellSource::Structured,
            },
            "//server/@port",
        );
        let (report, surface) = run_session(&[temp_dir.path().to_path_buf()], &config, "")?;

        assert_eq!(report.hits, 2);
        assert_eq!(report.files, 1);
        assert!(surface.contains_line("a.xml"));
        assert!(!surface.contains_line("b.json"));
        Ok(())
    }

    #[test]
    fn should_show_xpath_hits_at_element_position() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("doc.xml");
        fs::write(&path, "<a>\n  <b>x</b>\n  <b>y</b>\n</a>\n")?;

        let config = auto(SearchMode::Structured, "//b");
        let (report, surface) = run_session(&[path], &config, "")?;

        assert_eq!(report.hits, 2);
        assert!(surface.contains_line("#1   Line:     2 Col:    3 -> "));
        assert!(surface.contains_line("#2   Line:     3 Col:    3 -> "));
        Ok(())
    }
}

mod binary_sessions {
    use super::*;

    fn windows_file(dir: &TempDir) -> anyhow::Result<PathBuf> {
        let path = dir.path().join("data.bin");
        let mut bytes = vec![0x01, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        fs::write(&path, bytes)?;
        Ok(path)
    }

    #[test]
    fn should_match_uint32_window() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = windows_file(&temp_dir)?;

        let config = auto(SearchMode::Binary(BinaryKind::U32), "1");
        let (report, surface) = run_session(&[path], &config, "")?;

        assert_eq!(report.hits, 1);
        let highlighted: Vec<bool> = surface.table_rows().iter().map(|(_, hit)| *hit).collect();
        assert_eq!(highlighted, vec![true, false]);
        Ok(())
    }

    #[test]
    fn should_match_float32_window_only_by_value() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = windows_file(&temp_dir)?;

        let config = auto(SearchMode::Binary(BinaryKind::F32), "1");
        let (report, surface) = run_session(&[path], &config, "")?;

        assert_eq!(report.hits, 1);
        let highlighted: Vec<bool> = surface.table_rows().iter().map(|(_, hit)| *hit).collect();
        assert_eq!(highlighted, vec![false, true]);
        Ok(())
    }

    /// `windows` 個のゼロウィンドウ。`hit_at` のウィンドウだけ uint32 の 1
    fn zero_file(
        dir: &TempDir,
        name: &str,
        windows: usize,
        hit_at: Option<usize>,
    ) -> anyhow::Result<PathBuf> {
        let path = dir.path().join(name);
        let mut bytes = vec![0u8; windows * 4];
        if let Some(index) = hit_at {
            bytes[index * 4] = 1;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    fn checkpoint_count(surface: &RecordingSurface) -> usize {
        let checkpoint = KeyProfile::Checkpoint.prompt();
        surface.prompts().iter().filter(|prompt| *prompt == checkpoint).count()
    }

    #[test]
    fn should_pause_at_checkpoints_in_auto_mode() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = zero_file(&temp_dir, "zeros.bin", 256, None)?;

        let config = auto(SearchMode::Binary(BinaryKind::U32), "7");
        let (report, surface) = run_session(&[path], &config, "yy")?;

        assert!(!report.canceled);
        assert_eq!(checkpoint_count(&surface), 2);
        assert_eq!(surface.table_rows().len(), 256);
        Ok(())
    }

    #[test]
    fn should_quit_at_first_checkpoint() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = zero_file(&temp_dir, "zeros.bin", 256, None)?;

        let config = auto(SearchMode::Binary(BinaryKind::U32), "7");
        let (report, surface) = run_session(&[path], &config, "n")?;

        assert!(report.canceled);
        assert_eq!(surface.table_rows().len(), 128);
        Ok(())
    }

    #[test]
    fn should_stop_pausing_after_disable_key() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = zero_file(&temp_dir, "zeros.bin", 384, None)?;

        let config = auto(SearchMode::Binary(BinaryKind::U32), "7");
        let (_, surface) = run_session(&[path], &config, "d")?;

        assert_eq!(checkpoint_count(&surface), 1);
        assert_eq!(surface.table_rows().len(), 384);
        Ok(())
    }

    #[test]
    fn should_skip_file_at_checkpoint() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        zero_file(&temp_dir, "a.bin", 256, None)?;
        zero_file(&temp_dir, "b.bin", 256, None)?;

        let config = auto(SearchMode::Binary(BinaryKind::U32), "7");
        let (report, surface) = run_session(&[temp_dir.path().to_path_buf()], &config, "s")?;

        assert_eq!(report.files, 2);
        // a.bin stops at the first checkpoint, b.bin is dumped in full
        assert_eq!(surface.table_rows().len(), 128 + 256);
        assert_eq!(checkpoint_count(&surface), 3);
        Ok(())
    }

    #[test]
    fn should_checkpoint_before_hit_on_same_window() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = zero_file(&temp_dir, "edge.bin", 128, Some(127))?;

        let config = SessionConfig::new(SearchMode::Binary(BinaryKind::U32), "1");
        let (report, surface) = run_session(&[path], &config, "yy")?;

        assert_eq!(report.hits, 1);
        assert_eq!(
            surface.prompts(),
            vec![
                KeyProfile::Checkpoint.prompt().to_string(),
                KeyProfile::BinaryHit.prompt().to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn should_quit_from_binary_hit() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("ones.bin");
        fs::write(&path, [1u8, 0, 0, 0].repeat(3))?;

        let config = SessionConfig::new(SearchMode::Binary(BinaryKind::U32), "1");
        let (report, surface) = run_session(&[path], &config, "n")?;

        assert!(report.canceled);
        assert_eq!(report.hits, 1);
        assert_eq!(surface.table_rows().len(), 1);
        Ok(())
    }
}
