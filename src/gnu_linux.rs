
use std::path::Path;
use std::time::Duration;

use crate::PlatformProvider;
use crate::PlatformInstaller;
use crate::path::get_home_relative_path;

const USER_SERVICE_TEMPLATE: &str = r#"
[Unit]
Description=Album Wallpaper Rotator
After=graphical-session.target

[Service]
Type=simple
ExecStart=%EXEC% run
Restart=on-failure

[Install]
WantedBy=graphical-session.target
"#;

fn other_error(msg: impl Into<String>) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, msg.into())
}

fn parent_dir(path: &Path) -> Result<&Path, std::io::Error> {
    path.parent().ok_or_else(|| other_error(format!("no parent directory: {}", path.display())))
}

fn systemctl_user(action: &str) -> Result<(), std::io::Error> {
    let status = std::process::Command::new("systemctl")
        .arg("--user")
        .arg(action)
        .arg("album-wallpaper.service")
        .status()?;
    if !status.success() {
        return Err(other_error(format!("systemctl --user {} failed", action)));
    }
    Ok(())
}

pub struct GnuLinuxInstaller;

impl PlatformInstaller for GnuLinuxInstaller {
    fn install(&self) -> Result<(), std::io::Error> {
        let install_path = get_home_relative_path(".local/bin/album-wallpaper")?;
        std::fs::create_dir_all(parent_dir(&install_path)?)?;
        let current_exe = std::env::current_exe()?;
        if current_exe != install_path {
            std::fs::copy(&current_exe, &install_path)?;
        }

        let service_path = get_home_relative_path(".local/share/systemd/user/album-wallpaper.service")?;
        std::fs::create_dir_all(parent_dir(&service_path)?)?;
        let service_file = USER_SERVICE_TEMPLATE.replace("%EXEC%", &install_path.to_string_lossy());
        std::fs::write(&service_path, service_file)?;
        log::info!("installed user service at {}", service_path.display());

        systemctl_user("daemon-reload")?;
        systemctl_user("enable")?;
        systemctl_user("restart")?;
        Ok(())
    }
}

fn file_uri(path: &Path) -> Result<String, std::io::Error> {
    let path = path.to_str().ok_or_else(|| other_error("path is not valid UTF-8"))?;
    Ok(format!("file://{}", path))
}

fn gsettings_set(schema: &str, key: &str, value: &str) -> Result<(), std::io::Error> {
    let status = std::process::Command::new("gsettings")
        .arg("set")
        .arg(schema)
        .arg(key)
        .arg(value)
        .status()?;
    if !status.success() {
        return Err(other_error(format!("gsettings set {} {} failed", schema, key)));
    }
    Ok(())
}

fn set_plasma_wallpaper(uri: &str) -> Result<(), std::io::Error> {
    let script = format!(
        "var allDesktops = desktops();\n\
         for (var i = 0; i < allDesktops.length; i++) {{\n\
           var d = allDesktops[i];\n\
           d.wallpaperPlugin = 'org.kde.image';\n\
           d.currentConfigGroup = ['Wallpaper', 'org.kde.image', 'General'];\n\
           d.writeConfig('Image', '{}');\n\
         }}\n",
        uri.replace('\'', "\\'")
    );

    let conn = dbus::blocking::Connection::new_session()
        .map_err(|e| other_error(format!("D-Bus session: {}", e)))?;
    let proxy = conn.with_proxy("org.kde.plasmashell", "/PlasmaShell", Duration::from_secs(5));
    let _: () = proxy
        .method_call("org.kde.PlasmaShell", "evaluateScript", (script,))
        .map_err(|e| other_error(format!("PlasmaShell.evaluateScript: {}", e)))?;
    Ok(())
}

pub struct GnuLinuxProvider;

impl PlatformProvider for GnuLinuxProvider {
    fn set_desktop_wallpaper(&self, path: &Path) -> Result<(), std::io::Error> {
        let xdg_current_desktop = std::env::var("XDG_CURRENT_DESKTOP")
            .map_err(|_| other_error("XDG_CURRENT_DESKTOP is not set"))?
            .to_lowercase();

        if xdg_current_desktop.contains("kde") {
            set_plasma_wallpaper(&file_uri(path)?)
        } else if xdg_current_desktop.contains("cinnamon") {
            gsettings_set("org.cinnamon.desktop.background", "picture-uri", &file_uri(path)?)
        } else if xdg_current_desktop.contains("mate") {
            gsettings_set("org.mate.background", "picture-filename", &path.to_string_lossy())
        } else if ["gnome", "unity", "budgie"].iter().any(|de| xdg_current_desktop.contains(de)) {
            let uri = file_uri(path)?;
            gsettings_set("org.gnome.desktop.background", "picture-uri", &uri)?;
            // GNOME 42+ keeps a separate dark-style wallpaper
            if let Err(e) = gsettings_set("org.gnome.desktop.background", "picture-uri-dark", &uri) {
                log::debug!("picture-uri-dark not updated: {}", e);
            }
            Ok(())
        } else {
            Err(other_error(format!("unsupported desktop environment: {}", xdg_current_desktop)))
        }
    }
}
