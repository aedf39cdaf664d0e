use bottles_wine::{Bottle, Error, Wine, WindowsVersion};
use std::path::Path;
use tracing::Level;

#[tokio::main]
pub async fn main() -> Result<(), Error> {
    let mut args = std::env::args().skip(1);
    let libraries = args.next().expect("Libraries path is required");
    let prefix = args.next().expect("Wine prefix path is required");
    let action = args.next().unwrap_or_else(|| "version".to_string());
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let wine = Wine::try_from(Path::new(&libraries))?;
    let bottle = Bottle::open(prefix)?;

    match action.as_str() {
        "version" => println!("{}", wine.version().await?),
        "winver" => println!("{}", wine.windows_version(&bottle).await?),
        "set-winver" => {
            let version: WindowsVersion = args
                .next()
                .expect("Windows version is required")
                .parse()?;
            wine.change_windows_version(&bottle, version).await?;
        }
        "cfg" => {
            wine.cfg(&bottle).await?;
        }
        "kill" => {
            wine.kill_bottle(&bottle).await?;
        }
        "dxvk" => {
            let report = wine.enable_dxvk(&bottle);
            for failure in report.failures() {
                eprintln!("{}: {}", failure.source.display(), failure.error);
            }
        }
        other => eprintln!("Unknown action '{other}'"),
    }

    Ok(())
}
