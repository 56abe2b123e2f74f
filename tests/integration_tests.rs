use clap::Parser;
use filetime::{FileTime, set_file_mtime};
use folderfix::cli::{Args, execute};
use folderfix::config::{FixerConfig, Rules};
/// Integration tests for folderfix
///
/// These tests build small asset trees and run the complete pipeline over
/// them, checking both the resulting layout and the reported tallies.
///
/// Test categories:
/// 1. Root file sorting and match tiers
/// 2. Subfolder structure and extension sorting
/// 3. Cleanup and reset modes
/// 4. Dry-run mode verification
/// 5. Configuration and filtering
/// 6. Edge cases and error scenarios
use folderfix::fixer::{FolderFixer, RunStats};
use folderfix::mode::ExecutionMode;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use walkdir::WalkDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary working directory with helpers for building asset trees.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file (and any missing parents) with the given content.
    fn create_file(&self, rel_path: &str, content: &str) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    fn create_files(&self, files: &[&str]) {
        for name in files {
            self.create_file(name, name);
        }
    }

    fn create_subdir(&self, rel_path: &str) {
        fs::create_dir_all(self.path().join(rel_path)).expect("Failed to create subdirectory");
    }

    fn set_mtime(&self, rel_path: &str, mtime: SystemTime) {
        set_file_mtime(self.path().join(rel_path), FileTime::from_system_time(mtime))
            .expect("Failed to set mtime");
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn run(&self, mode: ExecutionMode) -> RunStats {
        self.run_with(&Rules::default(), mode, false)
    }

    fn run_with(&self, rules: &Rules, mode: ExecutionMode, dry_run: bool) -> RunStats {
        FolderFixer::new(self.path(), rules, mode, dry_run)
            .run()
            .expect("Run failed")
    }

    /// Every path under the working directory, relative and sorted.
    fn snapshot(&self) -> Vec<String> {
        WalkDir::new(self.path())
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .map(|entry| {
                entry
                    .path()
                    .strip_prefix(self.path())
                    .expect("Path outside fixture")
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }
}

fn rules_from(toml: &str) -> Rules {
    FixerConfig::from_toml(toml)
        .expect("Failed to parse config")
        .compile()
        .expect("Failed to compile config")
}

// ============================================================================
// Root File Sorting
// ============================================================================

#[test]
fn test_tiers_route_files_to_component_folders() {
    let fixture = TestFixture::new();
    fixture.create_subdir("abby1_U101_v1");
    fixture.create_subdir("Sandhya_U101_v2_Main");
    fixture.create_subdir("Crate_P300");
    fixture.create_files(&[
        "abby1_U101_v1.fbx",
        "sandhya1_U101_v2.blend",
        "box_P300_v9.glb",
        "unknown_Z999.fbx",
    ]);

    let stats = fixture.run(ExecutionMode::Normal);

    // FULL
    fixture.assert_file_exists("abby1_U101_v1/Maya-Blender files/abby1_U101_v1.fbx");
    // BASE+VER
    fixture.assert_file_exists("Sandhya_U101_v2_Main/Maya-Blender files/sandhya1_U101_v2.blend");
    // BASE
    fixture.assert_file_exists("Crate_P300/Output format files/box_P300_v9.glb");
    // NONE
    fixture.assert_file_exists("unknown_Z999.fbx");

    assert_eq!(stats.unmatched, 1);
    assert_eq!(stats.moved, 6);
    assert_eq!(stats.failed, 0);
}

#[test]
fn test_base_match_for_version_missing_from_folder_names() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Sandhya_U101_Main");
    fixture.create_subdir("OtherFolder");
    fixture.create_files(&["sandhya1_U101_v1.fbx"]);

    fixture.run(ExecutionMode::Normal);

    fixture.assert_file_exists("Sandhya_U101_Main/Maya-Blender files/sandhya1_U101_v1.fbx");
    fixture.assert_dir_exists("OtherFolder/MD files");
}

#[test]
fn test_unsupported_and_hidden_root_files_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Hero_U101");
    fixture.create_files(&["hero_U101.txt", ".hero_U101.fbx", "~hero_U101.png"]);

    let stats = fixture.run(ExecutionMode::Normal);

    fixture.assert_file_exists("hero_U101.txt");
    fixture.assert_file_exists(".hero_U101.fbx");
    fixture.assert_file_exists("~hero_U101.png");
    assert_eq!(stats.moved, 0);
    assert_eq!(stats.unmatched, 0);
}

#[test]
fn test_sorted_candidates_break_ties_by_name() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Zed_U500");
    fixture.create_subdir("Alpha_U500");
    fixture.create_files(&["x_U500.fbx"]);

    fixture.run(ExecutionMode::Normal);

    fixture.assert_file_exists("Alpha_U500/Maya-Blender files/x_U500.fbx");
}

#[test]
fn test_identical_root_file_is_skipped_not_suffixed() {
    let fixture = TestFixture::new();
    let mtime = SystemTime::now() - Duration::from_secs(300);
    fixture.create_file("Hero_U101/hero_U101.fbx", "same bytes");
    fixture.create_file("hero_U101.fbx", "same bytes");
    fixture.set_mtime("Hero_U101/hero_U101.fbx", mtime);
    fixture.set_mtime("hero_U101.fbx", mtime);

    let stats = fixture.run(ExecutionMode::Normal);

    fixture.assert_file_exists("hero_U101.fbx");
    fixture.assert_file_not_exists("Hero_U101/hero_U101_1.fbx");
    fixture.assert_file_not_exists("Hero_U101/Maya-Blender files/hero_U101_1.fbx");
    assert_eq!(stats.skipped, 1);
}

#[test]
fn test_collision_exhaustion_counts_as_failed() {
    let fixture = TestFixture::new();
    fixture.create_file("Hero_U101/hero_U101.fbx", "a");
    fixture.create_file("Hero_U101/hero_U101_1.fbx", "bb");
    fixture.create_file("hero_U101.fbx", "a different, longer file");

    let rules = rules_from("[layout]\ncollision_limit = 1\n");
    let stats = fixture.run_with(&rules, ExecutionMode::Normal, false);

    assert_eq!(stats.failed, 1);
    fixture.assert_file_exists("hero_U101.fbx");
}

// ============================================================================
// Subfolder Structure
// ============================================================================

#[test]
fn test_structure_phase_buckets_existing_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        "Hero_U101/rig.ma",
        "Hero_U101/scene.mb",
        "Hero_U101/cloth.zprj",
        "Hero_U101/export.glb",
        "Hero_U101/readme.txt",
    ]);

    let stats = fixture.run(ExecutionMode::Normal);

    fixture.assert_file_exists("Hero_U101/Maya-Blender files/rig.ma");
    fixture.assert_file_exists("Hero_U101/Maya-Blender files/scene.mb");
    fixture.assert_file_exists("Hero_U101/MD files/cloth.zprj");
    fixture.assert_file_exists("Hero_U101/Output format files/export.glb");
    fixture.assert_file_exists("Hero_U101/readme.txt");
    assert_eq!(stats.moved, 4);
    assert_eq!(stats.folders_created, 3);
}

#[test]
fn test_extension_collision_gets_suffix() {
    let fixture = TestFixture::new();
    fixture.create_file("Hero_U101/MD files/tex.png", "old texture");
    fixture.create_file("Hero_U101/tex.png", "new texture, different size");

    let stats = fixture.run(ExecutionMode::Normal);

    assert_eq!(fixture.read("Hero_U101/MD files/tex.png"), "old texture");
    assert_eq!(
        fixture.read("Hero_U101/MD files/tex_1.png"),
        "new texture, different size"
    );
    assert_eq!(stats.folders_created, 2);
}

#[test]
fn test_overwrite_mode_replaces_category_file() {
    let fixture = TestFixture::new();
    fixture.create_file("Hero_U101/MD files/tex.png", "old texture");
    fixture.create_file("Hero_U101/tex.png", "new texture, different size");

    fixture.run(ExecutionMode::Overwrite);

    assert_eq!(
        fixture.read("Hero_U101/MD files/tex.png"),
        "new texture, different size"
    );
    fixture.assert_file_not_exists("Hero_U101/MD files/tex_1.png");
}

// ============================================================================
// Cleanup and Reset
// ============================================================================

#[test]
fn test_clean_mode_root_copy_takes_precedence() {
    let fixture = TestFixture::new();
    fixture.create_file("Hero_U101/A/B/file.png", "nested");
    fixture.create_file("file.png", "root");

    let stats = fixture.run(ExecutionMode::Clean);

    fixture.assert_file_exists("Hero_U101/A/B/file.png");
    fixture.assert_dir_exists("Hero_U101/A/B");
    fixture.assert_file_exists("file.png");
    assert_eq!(stats.cleanup_moved, 0);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn test_clean_mode_flattens_deep_trees() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        "Hero_U101/v1/old/mesh.fbx",
        "Hero_U101/v1/textures/skin.png",
        "Hero_U101/v2/Output format files/final.glb",
        "Hero_U101/v2/.DS_Store",
    ]);

    let stats = fixture.run(ExecutionMode::Clean);

    fixture.assert_file_exists("Hero_U101/Maya-Blender files/mesh.fbx");
    fixture.assert_file_exists("Hero_U101/MD files/skin.png");
    fixture.assert_file_exists("Hero_U101/Output format files/final.glb");
    fixture.assert_file_not_exists("Hero_U101/v1");
    // Hidden file keeps its folder alive
    fixture.assert_file_exists("Hero_U101/v2/.DS_Store");
    assert_eq!(stats.cleanup_moved, 3);
    assert_eq!(stats.folders_cleaned, 4);
}

#[test]
fn test_reset_mode_drops_stale_copies() {
    let fixture = TestFixture::new();
    fixture.create_file("Hero_U101/mesh.fbx", "v1");
    fixture.create_file("Hero_U101/mesh_1.fbx", "v1 copy");
    fixture.create_file("Hero_U101/mesh_2.fbx", "v1 copy 2");
    fixture.create_file("Hero_U101/upload/mesh.fbx", "v2 final");

    let stats = fixture.run(ExecutionMode::ResetOverwrite);

    assert_eq!(
        fixture.read("Hero_U101/Maya-Blender files/mesh.fbx"),
        "v2 final"
    );
    fixture.assert_file_not_exists("Hero_U101/Maya-Blender files/mesh_1.fbx");
    fixture.assert_file_not_exists("Hero_U101/Maya-Blender files/mesh_2.fbx");
    fixture.assert_file_not_exists("Hero_U101/upload");
    assert_eq!(stats.cleanup_moved, 1);
}

// ============================================================================
// Dry Run
// ============================================================================

#[test]
fn test_dry_run_leaves_tree_untouched() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        "hero_U101.fbx",
        "Hero_U101/A/B/deep.png",
        "Hero_U101/mesh.fbx",
        "Hero_U101/mesh_1.fbx",
        "Hero_U101/sub/mesh.fbx",
    ]);
    let before = fixture.snapshot();

    for mode in ExecutionMode::ALL {
        let stats = fixture.run_with(&Rules::default(), mode, true);
        assert!(stats.moved > 0, "mode {} reported nothing", mode);
        assert_eq!(fixture.snapshot(), before, "mode {} changed the tree", mode);
    }
}

// ============================================================================
// Configuration and Filtering
// ============================================================================

#[test]
fn test_custom_categories_from_config_file() {
    let fixture = TestFixture::new();
    fixture.create_file(
        ".folderfix.toml",
        r#"
[[layout.categories]]
folder = "Textures"
extensions = ["PNG", ".tga"]

[[layout.categories]]
folder = "Meshes"
extensions = [".fbx"]
"#,
    );
    fixture.create_files(&["hero_U101.tga", "hero_U101.glb", "Hero_U101/body.fbx"]);

    let args = Args::parse_from(["folderfix", "--no-prompt"]);
    let stats = execute(
        &args,
        fixture.path(),
        ExecutionMode::Normal,
        &mut Cursor::new(""),
        &mut Vec::<u8>::new(),
    )
    .expect("Run failed")
    .expect("Run was cancelled");

    fixture.assert_file_exists("Hero_U101/Textures/hero_U101.tga");
    fixture.assert_file_exists("Hero_U101/Meshes/body.fbx");
    fixture.assert_file_exists("hero_U101.glb");
    fixture.assert_file_not_exists("Hero_U101/MD files");
    assert_eq!(stats.folders_created, 2);
}

#[test]
fn test_excluded_files_are_never_moved() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        "hero_U101_backup.fbx",
        "hero_U101.fbx",
        "Hero_U101/nested/temp_render.png",
    ]);

    let rules = rules_from(
        r#"
[filters.exclude]
patterns = ["*_backup.*"]
regex = ["^temp_"]
"#,
    );
    let stats = fixture.run_with(&rules, ExecutionMode::Clean, false);

    fixture.assert_file_exists("hero_U101_backup.fbx");
    fixture.assert_file_exists("Hero_U101/nested/temp_render.png");
    fixture.assert_file_exists("Hero_U101/Maya-Blender files/hero_U101.fbx");
    assert_eq!(stats.cleanup_moved, 0);
}

#[test]
fn test_overlapping_categories_rejected() {
    let result = FixerConfig::from_toml(
        r#"
[[layout.categories]]
folder = "A"
extensions = [".png"]

[[layout.categories]]
folder = "B"
extensions = [".PNG"]
"#,
    )
    .expect("Failed to parse config")
    .compile();

    assert!(result.is_err());
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let fixture = TestFixture::new();
    let args = Args::parse_from(["folderfix", "--no-prompt", "--config", "/non/existent.toml"]);
    let result = execute(
        &args,
        fixture.path(),
        ExecutionMode::Normal,
        &mut Cursor::new(""),
        &mut Vec::<u8>::new(),
    );
    assert!(result.is_err());
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_empty_directory() {
    let fixture = TestFixture::new();
    let stats = fixture.run(ExecutionMode::ResetOverwrite);
    assert_eq!(
        stats,
        RunStats {
            duration: stats.duration,
            ..Default::default()
        }
    );
}

#[test]
fn test_confirmation_declined_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&["hero_U101.fbx", "Hero_U101/nested/mesh.fbx"]);
    let before = fixture.snapshot();

    let args = Args::parse_from(["folderfix", "--clean"]);
    let result = execute(
        &args,
        fixture.path(),
        ExecutionMode::Clean,
        &mut Cursor::new("n\n"),
        &mut Vec::<u8>::new(),
    )
    .expect("Run failed");

    assert!(result.is_none());
    assert_eq!(fixture.snapshot(), before);
}
