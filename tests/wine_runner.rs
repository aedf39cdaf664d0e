#![cfg(unix)]

use bottles_wine::{
    Bottle, BottleSettings, Environment, Error, Program, ProgramSettings, Wine, WindowsVersion,
};
use std::{collections::BTreeMap, fs, os::unix::fs::PermissionsExt, path::Path};
use tempfile::TempDir;

const FAKE_WINE: &str = r#"#!/bin/sh
case "$1" in
--version)
    echo "wine-8.0.2 (Staging)"
    ;;
winecfg)
    if [ "$2" = "-v" ]; then
        if [ -n "$3" ]; then
            echo "$3" > "$WINEPREFIX/winver"
        else
            echo "0024:fixme:winecfg:main stub"
            cat "$WINEPREFIX/winver" 2>/dev/null || echo win10
        fi
    else
        echo "WINEPREFIX=$WINEPREFIX"
        echo "WINEDEBUG=$WINEDEBUG"
        echo "WINEBOOT_HIDE_DIALOG=$WINEBOOT_HIDE_DIALOG"
        echo "WINEDLLOVERRIDES=${WINEDLLOVERRIDES:-}"
    fi
    ;;
start)
    echo "$*"
    echo "LANG=${LANG:-}"
    pwd -P
    ;;
*)
    echo "wine: could not find $1" >&2
    exit 1
    ;;
esac
"#;

const FAKE_WINESERVER: &str = r#"#!/bin/sh
echo "args=$*"
echo "WINEPREFIX=${WINEPREFIX:-unset}"
echo "WINEDEBUG=${WINEDEBUG:-unset}"
"#;

struct Fixture {
    libraries: TempDir,
    prefix: TempDir,
    wine: Wine,
}

impl Fixture {
    fn new() -> Self {
        let libraries = tempfile::tempdir().unwrap();
        let bin = libraries.path().join("Wine").join("bin");
        fs::create_dir_all(&bin).unwrap();
        write_script(&bin.join("wine64"), FAKE_WINE);
        write_script(&bin.join("wineserver"), FAKE_WINESERVER);

        let prefix = tempfile::tempdir().unwrap();
        let wine = Wine::try_from(libraries.path()).unwrap();
        Self {
            libraries,
            prefix,
            wine,
        }
    }

    fn bottle(&self, settings: BottleSettings) -> Bottle {
        Bottle::with_settings(self.prefix.path(), settings)
    }
}

fn write_script(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Freshly written scripts can briefly report ETXTBSY while another test
/// thread forks, so spawning is retried a few times
async fn retry_busy<F, Fut, T>(mut f: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, Error>>,
{
    const ETXTBSY: i32 = 26;
    let mut attempts = 0;
    loop {
        match f().await {
            Err(Error::Launch { source, .. })
                if source.raw_os_error() == Some(ETXTBSY) && attempts < 5 =>
            {
                attempts += 1;
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            result => return result,
        }
    }
}

#[tokio::test]
async fn version_is_parsed() {
    let fixture = Fixture::new();
    let version = retry_busy(|| fixture.wine.version()).await.unwrap();
    assert_eq!(version, "8.0.2");
}

#[tokio::test]
async fn output_is_returned_verbatim() {
    let fixture = Fixture::new();
    let output = retry_busy(|| fixture.wine.run(["--version"], None, None))
        .await
        .unwrap();
    assert_eq!(output, "wine-8.0.2 (Staging)\n");
}

#[tokio::test]
async fn failure_carries_the_output() {
    let fixture = Fixture::new();
    let err = retry_busy(|| fixture.wine.run(["bogus"], None, None))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "wine: could not find bogus\n");
    assert!(matches!(err, Error::ProcessFailed { code: Some(1), .. }));
}

#[tokio::test]
async fn missing_binary_fails_to_launch() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.libraries.path().join("Wine/bin/wine64")).unwrap();

    let err = fixture.wine.version().await.unwrap_err();
    assert!(matches!(err, Error::Launch { .. }));
}

#[tokio::test]
async fn bottle_environment_reaches_wine() {
    let fixture = Fixture::new();
    let bottle = fixture.bottle(BottleSettings::default());
    let overrides: Environment = [("WINEDEBUG", "-all")].into_iter().collect();

    let output = retry_busy(|| fixture.wine.run(["winecfg"], Some(&bottle), Some(&overrides)))
        .await
        .unwrap();

    let expected = format!(
        "WINEPREFIX={}\nWINEDEBUG=-all\nWINEBOOT_HIDE_DIALOG=1\nWINEDLLOVERRIDES=\n",
        fixture.prefix.path().display()
    );
    assert_eq!(output, expected);
}

#[tokio::test]
async fn windows_version_round_trip() {
    let fixture = Fixture::new();
    let bottle = fixture.bottle(BottleSettings::default());

    let current = retry_busy(|| fixture.wine.windows_version(&bottle))
        .await
        .unwrap();
    assert_eq!(current, WindowsVersion::Win10);

    retry_busy(|| fixture.wine.change_windows_version(&bottle, WindowsVersion::Win81))
        .await
        .unwrap();
    let current = fixture.wine.windows_version(&bottle).await.unwrap();
    assert_eq!(current, WindowsVersion::Win81);
}

#[tokio::test]
async fn unknown_windows_version_is_rejected() {
    let fixture = Fixture::new();
    let bottle = fixture.bottle(BottleSettings::default());

    retry_busy(|| fixture.wine.run(["winecfg", "-v", "win95"], Some(&bottle), None))
        .await
        .unwrap();
    let err = fixture.wine.windows_version(&bottle).await.unwrap_err();

    match err {
        Error::InvalidResponse { output } => assert!(output.ends_with("win95\n")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn run_program_starts_from_its_directory() {
    let fixture = Fixture::new();
    let bottle = fixture.bottle(BottleSettings::default());
    let game_dir = fixture.prefix.path().join("drive_c").join("Games");
    fs::create_dir_all(&game_dir).unwrap();
    let exe = game_dir.join("game.exe");

    let settings = ProgramSettings {
        environment: BTreeMap::from([("LANG".to_string(), "ja_JP.UTF-8".to_string())]),
    };
    let program = Program::with_settings(&exe, bottle, settings);

    let output = retry_busy(|| fixture.wine.run_program(&program))
        .await
        .unwrap();

    let expected = format!(
        "start /unix {}\nLANG=ja_JP.UTF-8\n{}\n",
        exe.display(),
        game_dir.canonicalize().unwrap().display()
    );
    assert_eq!(output, expected);
}

#[tokio::test]
async fn kill_bottle_only_passes_the_prefix() {
    let fixture = Fixture::new();
    let bottle = fixture.bottle(BottleSettings::default());

    let output = retry_busy(|| fixture.wine.kill_bottle(&bottle))
        .await
        .unwrap();

    let expected = format!(
        "args=-k\nWINEPREFIX={}\nWINEDEBUG=unset\n",
        fixture.prefix.path().display()
    );
    assert_eq!(output, expected);
}

#[tokio::test]
async fn dxvk_bottles_get_the_overlay_before_running() {
    let fixture = Fixture::new();
    let layout = fixture.wine.layout().clone();
    fs::create_dir_all(layout.dxvk_x64()).unwrap();
    fs::create_dir_all(layout.dxvk_x32()).unwrap();
    fs::write(layout.dxvk_x64().join("dxgi.dll"), "dxvk dxgi 64").unwrap();
    fs::write(layout.dxvk_x32().join("dxgi.dll"), "dxvk dxgi 32").unwrap();

    let bottle = fixture.bottle(BottleSettings {
        dxvk: true,
        ..Default::default()
    });
    fs::create_dir_all(bottle.system32()).unwrap();
    fs::create_dir_all(bottle.syswow64()).unwrap();
    fs::write(bottle.system32().join("dxgi.dll"), "stock").unwrap();

    let output = retry_busy(|| fixture.wine.cfg(&bottle)).await.unwrap();

    assert!(output.contains("WINEDLLOVERRIDES=dxgi,d3d9,d3d10core,d3d11=n,b\n"));
    assert_eq!(
        fs::read_to_string(bottle.system32().join("dxgi.dll")).unwrap(),
        "dxvk dxgi 64"
    );
    assert_eq!(
        fs::read_to_string(bottle.syswow64().join("dxgi.dll")).unwrap(),
        "dxvk dxgi 32"
    );
}
