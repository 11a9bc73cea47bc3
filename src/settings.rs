use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tunnel: TunnelSettings,
}

/// Optional defaults applied before CLI flags. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct TunnelSettings {
    pub preset: Option<String>,
    pub size: Option<f32>,
    pub speed: Option<f32>,
    pub hue: Option<f32>,
    pub amplitude: Option<f32>,
    pub depth: Option<u32>,
    pub base_angle: Option<f32>,
    pub length_reduction: Option<f32>,
    pub kind: Option<String>,
    pub axis: Option<String>,
    pub axis_speed: Option<f32>,
    pub tunnel_depth: Option<f32>,
    pub focal_length: Option<f32>,
    pub layers: Option<u32>,
    pub trail_fade: Option<f32>,
    /// Frame delay in seconds
    pub time: Option<f32>,
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("termtunnel")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_parse_with_defaults() {
        let settings: Settings = toml::from_str(
            "[tunnel]\npreset = \"glow\"\ndepth = 9\n",
        )
        .unwrap();
        assert_eq!(settings.tunnel.preset.as_deref(), Some("glow"));
        assert_eq!(settings.tunnel.depth, Some(9));
        assert_eq!(settings.tunnel.size, None);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert!(settings.tunnel.preset.is_none());
        assert!(settings.tunnel.time.is_none());
    }
}
