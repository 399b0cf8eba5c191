//! End-to-end tests for the liedcli binary, running against a temporary
//! directory layout configured through a config file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const SONG: &str = "\
!NoteWorthyComposer(2.751)
|SongInfo|Title:\"Avondlied\"|Author:\"\"
|PgSetup|StaffSize:16|BarNumbers:None|StartingBar:0
|AddStaff|Name:\"Zang\"|Label:\"Zang\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|StaffProperties|Muted:N|Volume:127|StereoPan:64|Device:0|Channel:1
|Clef|Type:Treble
|TimeSig|Signature:4/4
|Tempo|Tempo:96|Pos:12
|Rest|Dur:4th
|Bar
|Note|Dur:4th|Pos:0
|Note|Dur:4th|Pos:1
|Bar
|Note|Dur:Half|Pos:2
|Bar
|Note|Dur:Whole|Pos:3
|Lyric1|Text:\"zing een lied mee\"|Placement:Bottom
|AddStaff|Name:\"Bass\"|Label:\"Bass\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|StaffProperties|Muted:N|Volume:110|StereoPan:64|Device:0|Channel:2
|Clef|Type:Bass
|TimeSig|Signature:4/4
|Tempo|Tempo:96|Pos:12
|Rest|Dur:4th
|Bar
|Text|Text:\"liedstart\"|Font:User1
|Note|Dur:Whole|Pos:-3
|Bar
|Note|Dur:Whole|Pos:-1
|Bar
|Note|Dur:Whole|Pos:0
!NoteWorthyComposer-End
";

const SECTION_COUPLET: &str = "\
!NoteWorthyComposer(2.751)
|SongInfo|Title:\"couplet\"
|AddStaff|Name:\"Zang\"|Label:\"Zang\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|Clef|Type:Treble
|TimeSig|Signature:4/4
|Tempo|Tempo:96|Pos:12
|Text|Text:\"akk: C\"|Font:User2
|Note|Dur:Whole|Pos:0
|Bar
|Note|Dur:Whole|Pos:1
|AddStaff|Name:\"Bass\"|Label:\"Bass\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|Clef|Type:Bass
|TimeSig|Signature:4/4
|Note|Dur:Whole|Pos:-3
|Bar
|Note|Dur:Whole|Pos:-1
!NoteWorthyComposer-End
";

const SECTION_REFREIN: &str = "\
!NoteWorthyComposer(2.751)
|SongInfo|Title:\"refrein\"
|AddStaff|Name:\"Zang\"|Label:\"Zang\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|Clef|Type:Treble
|TimeSig|Signature:4/4
|Text|Text:\"akk: G\"|Font:User2
|Note|Dur:Whole|Pos:2
|Bar
|Note|Dur:Whole|Pos:3
|AddStaff|Name:\"Bass\"|Label:\"Bass\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|Clef|Type:Bass
|TimeSig|Signature:4/4
|Note|Dur:Whole|Pos:-1
|Bar
|Note|Dur:Whole|Pos:0
!NoteWorthyComposer-End
";

struct TestDirs {
    _root: tempfile::TempDir,
    config: PathBuf,
    songs: PathBuf,
    build: PathBuf,
    audio: PathBuf,
}

fn setup() -> TestDirs {
    let root = tempfile::tempdir().unwrap();
    let songs = root.path().join("bron");
    let build = root.path().join("build");
    let audio = root.path().join("audio");
    fs::create_dir_all(&songs).unwrap();
    fs::create_dir_all(&build).unwrap();
    fs::create_dir_all(&audio).unwrap();

    let config = root.path().join("liedwerk.toml");
    fs::write(
        &config,
        format!(
            "[paths]\nsongs_dir = \"{}\"\nbuild_dir = \"{}\"\naudio_dir = \"{}\"\n",
            songs.display(),
            build.display(),
            audio.display()
        ),
    )
    .unwrap();

    TestDirs {
        _root: root,
        config,
        songs,
        build,
        audio,
    }
}

fn liedcli(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("liedcli").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn test_help() {
    Command::cargo_bin("liedcli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("concat"))
        .stdout(predicate::str::contains("stems"));
}

#[test]
fn test_analyze_bare_title() {
    let dirs = setup();
    fs::write(dirs.build.join("Avondlied.nwctxt"), SONG).unwrap();

    liedcli(&dirs.config)
        .args(["analyze", "Avondlied"])
        .assert()
        .success();

    let report = fs::read_to_string(dirs.build.join("Avondlied analysis.txt")).unwrap();
    assert!(report.contains("*** NWC ANALYSE ***"));
    assert!(report.contains("liedtitel: Avondlied"));
    assert!(report.contains("heeft begintel: ja"));
    assert!(report.contains("totaal aantal maten: 3"));
    assert!(report.contains("1\tzing een"));
}

#[test]
fn test_analyze_missing_file() {
    let dirs = setup();
    liedcli(&dirs.config)
        .args(["analyze", "bestaat-niet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_concat_produces_artifacts() {
    let dirs = setup();
    let nwc = dirs.songs.join("Testlied").join("nwc");
    fs::create_dir_all(&nwc).unwrap();
    fs::write(nwc.join("Testlied couplet.nwctxt"), SECTION_COUPLET).unwrap();
    fs::write(nwc.join("Testlied refrein.nwctxt"), SECTION_REFREIN).unwrap();
    fs::write(
        nwc.join("Testlied volgorde.toml"),
        "songstructure = [\"couplet\", \"refrein\", \"couplet\"]\n",
    )
    .unwrap();

    liedcli(&dirs.config)
        .args(["concat", "Testlied"])
        .assert()
        .success();

    let merged = fs::read_to_string(dirs.build.join("Testlied.nwctxt")).unwrap();
    // One setup block per staff, three bodies joined by double-bar separators.
    assert_eq!(merged.matches("|AddStaff|").count(), 2);
    assert_eq!(merged.matches("|Bar|Style:Double").count(), 4);
    assert!(merged.ends_with("!NoteWorthyComposer-End\n"));

    let tex = fs::read_to_string(dirs.build.join("Testlied structuur.tex")).unwrap();
    assert!(tex.contains("\\section*{Lied structuur}"));
    assert!(tex.contains("Tempo & 96"));
    assert!(tex.contains("couplet & 2 & C(2)"));

    assert!(dirs.build.join("Testlied analysis.txt").exists());

    let labels = fs::read_to_string(dirs.audio.join("Testlied labeltrack t_96.txt")).unwrap();
    let lines: Vec<&str> = labels.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("0.000000\t0.000000\tcouplet"));
    // Each section is 2 measures of 4 beats at 96 bpm, 5 seconds.
    assert!(lines[1].starts_with("5.000000\t5.000000\trefrein"));
    assert!(lines[2].starts_with("10.000000\t10.000000\tcouplet"));
}

#[test]
fn test_concat_updates_song_tex() {
    let dirs = setup();
    let song_folder = dirs.songs.join("Testlied");
    let nwc = song_folder.join("nwc");
    fs::create_dir_all(&nwc).unwrap();
    fs::write(nwc.join("Testlied couplet.nwctxt"), SECTION_COUPLET).unwrap();
    fs::write(
        nwc.join("Testlied volgorde.toml"),
        "songstructure = [\"couplet\"]\n",
    )
    .unwrap();
    fs::write(
        song_folder.join("Testlied.tex"),
        "\\newcommand{\\tempo}{999}\n\\newcommand{\\maatsoort}{9/9}\n",
    )
    .unwrap();

    liedcli(&dirs.config)
        .args(["concat", "Testlied"])
        .assert()
        .success();

    let tex = fs::read_to_string(song_folder.join("Testlied.tex")).unwrap();
    assert!(tex.contains("\\newcommand{\\tempo}{96}"));
    assert!(tex.contains("\\newcommand{\\maatsoort}{4/4}"));
}

#[test]
fn test_stems_writes_solo_copies() {
    let dirs = setup();
    fs::write(dirs.build.join("Avondlied.nwctxt"), SONG).unwrap();

    liedcli(&dirs.config)
        .args(["stems", "Avondlied"])
        .assert()
        .success();

    let zang = fs::read_to_string(dirs.audio.join("Avondlied Zang.nwctxt")).unwrap();
    // Zang stays audible, Bass is muted.
    assert!(zang.contains("Muted:N|Volume:127"));
    assert!(zang.contains("Muted:Y|Volume:127"));

    let bass = fs::read_to_string(dirs.audio.join("Avondlied Bass.nwctxt")).unwrap();
    let bass_staff_at = bass.find("Name:\"Bass\"").unwrap();
    assert!(bass[bass_staff_at..].contains("Muted:N"));
    assert!(bass[..bass_staff_at].contains("Muted:Y"));
}

#[test]
fn test_stems_unknown_staff_fails() {
    let dirs = setup();
    fs::write(dirs.build.join("Avondlied.nwctxt"), SONG).unwrap();

    liedcli(&dirs.config)
        .args(["stems", "Avondlied", "--staves", "Piano"])
        .assert()
        .failure();
}
