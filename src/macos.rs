
use std::path::Path;

use crate::path::get_home_relative_path;
use crate::PlatformProvider;

fn other_error(msg: impl Into<String>) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, msg.into())
}

pub fn run_osascript(script: &str) -> Result<String, std::io::Error> {
    let output = std::process::Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()?;
    if !output.status.success() {
        return Err(other_error(String::from_utf8_lossy(&output.stderr).trim().to_string()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

const AGENT_PLIST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>org.menhera.album-wallpaper</string>
    <key>ProgramArguments</key>
    <array>
        <string>%EXEC%</string>
        <string>run</string>
    </array>
    <key>KeepAlive</key>
    <true/>
</dict>
</plist>
"#;

pub struct MacosInstaller;

impl crate::PlatformInstaller for MacosInstaller {
    fn install(&self) -> Result<(), std::io::Error> {
        let app_dir = get_home_relative_path("Library/album-wallpaper")?;
        std::fs::create_dir_all(&app_dir)?;

        let bin_path = app_dir.join("album-wallpaper");
        let current_exe = std::env::current_exe()?;
        if current_exe != bin_path {
            std::fs::copy(&current_exe, &bin_path)?;
        }

        let agent_dir = get_home_relative_path("Library/LaunchAgents")?;
        std::fs::create_dir_all(&agent_dir)?;
        let agent_file = agent_dir.join("org.menhera.album-wallpaper.plist");

        let agent_plist = AGENT_PLIST_TEMPLATE.replace("%EXEC%", &bin_path.to_string_lossy());
        std::fs::write(&agent_file, agent_plist)?;
        log::info!("installed launch agent at {}", agent_file.display());

        std::process::Command::new("launchctl")
            .arg("load")
            .arg(&agent_file)
            .output()?;
        Ok(())
    }
}

pub struct MacosProvider;

impl PlatformProvider for MacosProvider {
    fn set_desktop_wallpaper(&self, path: &Path) -> Result<(), std::io::Error> {
        let path = path.to_str().ok_or_else(|| other_error("path is not valid UTF-8"))?;
        let escaped = path.replace('\\', "\\\\").replace('"', "\\\"");
        run_osascript(&format!(
            "tell application \"System Events\" to tell every desktop to set picture to \"{}\" as POSIX file",
            escaped
        ))?;
        Ok(())
    }
}
